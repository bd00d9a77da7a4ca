use stagelink_gcode::parse_line;

use crate::cmd::ParseArgs;
use crate::exit::{gcode_error, CliResult, SUCCESS};
use crate::output::{print_parsed_line, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let parsed = parse_line(&args.line).map_err(|err| gcode_error("invalid command line", err))?;
    print_parsed_line(&parsed, format);
    Ok(SUCCESS)
}
