use crate::loader::DataType;
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const OFFSET_PREFIX: &str = "offset_";

/// `offset_*` directories directly under `base`, sorted by path.
pub fn discover_offsets(base: &Path) -> Result<Vec<PathBuf>> {
    let mut offsets = Vec::new();
    let entries = std::fs::read_dir(base).with_context(|| format!("reading base folder {}", base.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_offset = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(OFFSET_PREFIX));
        if path.is_dir() && is_offset {
            offsets.push(path);
        }
    }
    offsets.sort();
    Ok(offsets)
}

/// Hours encoded after the last `_` of an offset folder name (`offset_27` -> 27).
pub fn parse_offset_hours(offset_folder: &Path) -> Result<f64> {
    let name = offset_folder
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no usable folder name", offset_folder.display()))?;
    let suffix = name.rsplit('_').next().unwrap_or(name);
    suffix
        .parse::<f64>()
        .with_context(|| format!("offset folder {} does not end in a number of hours", name))
}

/// `control` -> `Control`.
pub fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Group subfolders of an offset folder mapped to the data-type folders they contain.
///
/// `offset_27/control/spots` yields `{"Control": {Spots: .../control/spots}}`.
pub fn discover_group_folders(offset_folder: &Path) -> Result<BTreeMap<String, BTreeMap<DataType, PathBuf>>> {
    let mut groups = BTreeMap::new();
    let entries = std::fs::read_dir(offset_folder)
        .with_context(|| format!("reading offset folder {}", offset_folder.display()))?;
    for entry in entries {
        let group_dir = entry?.path();
        if !group_dir.is_dir() {
            continue;
        }
        let Some(name) = group_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let mut data_folders = BTreeMap::new();
        for data_type in DataType::ALL {
            let folder = group_dir.join(data_type.as_str());
            if folder.is_dir() {
                data_folders.insert(data_type, folder);
            }
        }
        groups.insert(capitalize(name), data_folders);
    }
    Ok(groups)
}
