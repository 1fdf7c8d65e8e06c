use eulerbench::prelude::*;

/// Names scores
///
/// Sort the names in `data/p0022_names.txt` alphabetically, then multiply each
/// name's alphabetical value by its position. What is the total of all scores?
#[problem(answer = 30331)]
pub struct Problem0022;

const NAMES_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/p0022_names.txt");

#[data]
fn names() -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(NAMES_FILE)?;
    let mut names: Vec<String> = text
        .split(',')
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    Ok(names)
}

fn score(name: &str) -> u64 {
    name.bytes().map(|b| u64::from(b - b'A' + 1)).sum()
}

#[solve]
fn solve(data: &DataHandle) -> Result<u64, DataError> {
    let names = data.load::<Vec<String>>()?;
    Ok(names
        .iter()
        .enumerate()
        .map(|(i, name)| (i as u64 + 1) * score(name))
        .sum())
}
