use super::{json_pretty, print_summary, EXIT_SUCCESS};
use vmshift_core::{TransformationSummary, BUILTIN_TRANSFORMATIONS};
use vmshift_schema::Settings;

pub fn run(settings: &Settings, json: bool) -> Result<u8, String> {
    let rows: Vec<TransformationSummary> = BUILTIN_TRANSFORMATIONS
        .iter()
        .enumerate()
        .map(|(i, name)| TransformationSummary {
            ordinal: i + 1,
            active: !settings.is_disabled(name),
            name: (*name).to_owned(),
        })
        .collect();

    if json {
        println!("{}", json_pretty(&rows)?);
    } else {
        print_summary(&rows);
    }
    Ok(EXIT_SUCCESS)
}
