// THEORY:
// The file partition splits the combined spot and edge tables into one view per
// imaging file. Every computation downstream (center, spot lookup, edge
// decomposition) depends only on one of these views, which is what makes files
// independent of each other and safe to hand to separate workers.
//
// The views borrow rows from the caller's tables; nothing is copied here.

use crate::core_modules::edge::Edge;
use crate::core_modules::spot::Spot;
use std::collections::HashMap;

/// The order in which files are enumerated by the cross-file driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileOrder {
    /// Order in which each `File_ID` first appears in the spot table.
    #[default]
    FirstAppearance,
    /// `File_ID`s sorted as strings.
    Lexicographic,
}

/// All spots and edges that share one `File_ID`.
#[derive(Debug, Clone)]
pub struct FileGroup<'a> {
    pub file_id: &'a str,
    pub spots: Vec<&'a Spot>,
    pub edges: Vec<&'a Edge>,
}

impl<'a> FileGroup<'a> {
    /// Builds the view for a single `file_id` by scanning both tables.
    pub fn select(file_id: &'a str, spots: &'a [Spot], edges: &'a [Edge]) -> Self {
        Self {
            file_id,
            spots: spots.iter().filter(|s| s.file_id == file_id).collect(),
            edges: edges.iter().filter(|e| e.file_id == file_id).collect(),
        }
    }

    pub fn spot_index(&self) -> SpotIndex<'a> {
        SpotIndex::new(&self.spots)
    }
}

/// Lookup of spots by `ID` within one file.
#[derive(Debug)]
pub struct SpotIndex<'a> {
    by_id: HashMap<i64, &'a Spot>,
    duplicates: usize,
}

impl<'a> SpotIndex<'a> {
    pub fn new(spots: &[&'a Spot]) -> Self {
        let mut by_id = HashMap::with_capacity(spots.len());
        let mut duplicates = 0;
        for spot in spots {
            // First row in table order wins.
            if by_id.contains_key(&spot.id) {
                duplicates += 1;
            } else {
                by_id.insert(spot.id, *spot);
            }
        }
        Self { by_id, duplicates }
    }

    pub fn get(&self, id: i64) -> Option<&'a Spot> {
        self.by_id.get(&id).copied()
    }

    /// Rows whose `ID` was already taken by an earlier row of the same file.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// The combined tables split into per-file views.
#[derive(Debug)]
pub struct FilePartition<'a> {
    groups: Vec<FileGroup<'a>>,
    orphan_edges: usize,
}

impl<'a> FilePartition<'a> {
    /// Files are enumerated from the spot table. Edges whose `File_ID` has no
    /// spots at all are counted as orphans and belong to no group.
    pub fn new(spots: &'a [Spot], edges: &'a [Edge], order: FileOrder) -> Self {
        let mut groups: Vec<FileGroup<'a>> = Vec::new();
        let mut slot: HashMap<&'a str, usize> = HashMap::new();

        for spot in spots {
            let index = *slot.entry(spot.file_id.as_str()).or_insert_with(|| {
                groups.push(FileGroup {
                    file_id: spot.file_id.as_str(),
                    spots: Vec::new(),
                    edges: Vec::new(),
                });
                groups.len() - 1
            });
            groups[index].spots.push(spot);
        }

        let mut orphan_edges = 0;
        for edge in edges {
            match slot.get(edge.file_id.as_str()) {
                Some(&index) => groups[index].edges.push(edge),
                None => orphan_edges += 1,
            }
        }

        if order == FileOrder::Lexicographic {
            groups.sort_by(|a, b| a.file_id.cmp(b.file_id));
        }

        Self { groups, orphan_edges }
    }

    pub fn groups(&self) -> &[FileGroup<'a>] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<FileGroup<'a>> {
        self.groups
    }

    pub fn orphan_edges(&self) -> usize {
        self.orphan_edges
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (Vec<Spot>, Vec<Edge>) {
        let spots = vec![
            Spot::new("c2_offset_27", 1, 0.0, 0.0),
            Spot::new("c1_offset_27", 1, 5.0, 5.0),
            Spot::new("c2_offset_27", 2, 1.0, 1.0),
            Spot::new("c1_offset_27", 2, 6.0, 6.0),
        ];
        let edges = vec![
            Edge::new("c1_offset_27", 1, 2, 27.1),
            Edge::new("c2_offset_27", 1, 2, 27.1),
            Edge::new("missing", 1, 2, 27.1),
        ];
        (spots, edges)
    }

    #[test]
    fn first_appearance_order_follows_spot_table() {
        let (spots, edges) = tables();
        let partition = FilePartition::new(&spots, &edges, FileOrder::FirstAppearance);
        let ids: Vec<&str> = partition.groups().iter().map(|g| g.file_id).collect();
        assert_eq!(ids, vec!["c2_offset_27", "c1_offset_27"]);
        assert_eq!(partition.groups()[0].spots.len(), 2);
        assert_eq!(partition.groups()[0].edges.len(), 1);
        assert_eq!(partition.orphan_edges(), 1);
    }

    #[test]
    fn lexicographic_order_sorts_file_ids() {
        let (spots, edges) = tables();
        let partition = FilePartition::new(&spots, &edges, FileOrder::Lexicographic);
        let ids: Vec<&str> = partition.groups().iter().map(|g| g.file_id).collect();
        assert_eq!(ids, vec!["c1_offset_27", "c2_offset_27"]);
    }

    #[test]
    fn views_borrow_rather_than_copy() {
        let (spots, edges) = tables();
        let partition = FilePartition::new(&spots, &edges, FileOrder::FirstAppearance);
        assert!(std::ptr::eq(partition.groups()[0].spots[0], &spots[0]));
    }

    #[test]
    fn spot_index_keeps_first_duplicate() {
        let a = Spot::new("F1", 3, 1.0, 1.0);
        let b = Spot::new("F1", 3, 9.0, 9.0);
        let index = SpotIndex::new(&[&a, &b]);
        assert_eq!(index.get(3).map(|s| s.position_x), Some(1.0));
        assert_eq!(index.duplicates(), 1);
        assert!(index.get(4).is_none());
    }
}
