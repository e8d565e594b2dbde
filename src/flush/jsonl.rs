use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::{CountryId, World};

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[derive(Serialize)]
struct Owned<'a, T> {
    country_id: &'a CountryId,
    #[serde(flatten)]
    row: &'a T,
}

/// Snapshot the six game tables as JSONL files in `output_dir`.
///
/// Creates the directory if needed and overwrites earlier snapshots. Files:
/// `countries`, `resources`, `army`, `relations`, `seasons` and `events`,
/// each with a `.jsonl` extension. Resource and army rows carry their
/// `country_id`.
pub fn flush_to_jsonl(world: &World, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("countries.jsonl"), world.countries())?;
    write_jsonl(
        &output_dir.join("resources.jsonl"),
        world.countries().filter_map(|c| {
            world.resources(&c.id).map(|row| Owned {
                country_id: &c.id,
                row,
            })
        }),
    )?;
    write_jsonl(
        &output_dir.join("army.jsonl"),
        world.countries().filter_map(|c| {
            world.army(&c.id).map(|row| Owned {
                country_id: &c.id,
                row,
            })
        }),
    )?;
    write_jsonl(&output_dir.join("relations.jsonl"), world.relations())?;
    write_jsonl(&output_dir.join("seasons.jsonl"), world.seasons())?;
    write_jsonl(&output_dir.join("events.jsonl"), world.events().iter())?;

    Ok(())
}
