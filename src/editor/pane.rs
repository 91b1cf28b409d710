//! EditorPane - one tabbed editing surface

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::file::OpenFile;
use super::multicursor::MultiCursorEngine;
use super::state::PaneId;

/// A pane holding open files in tab order.
///
/// `open_files` and `tab_order` always hold the same set of paths, and
/// `active_file` is either `None` (only when the pane is empty) or one of
/// them. Both are private so the invariant can only change through the
/// methods below.
#[derive(Debug)]
pub struct EditorPane {
    id: PaneId,
    open_files: HashMap<PathBuf, OpenFile>,
    tab_order: Vec<PathBuf>,
    active_file: Option<PathBuf>,
    /// Multi-select for the active document
    pub multi_cursor: MultiCursorEngine,
}

impl EditorPane {
    pub fn new(id: PaneId) -> Self {
        Self {
            id,
            open_files: HashMap::new(),
            tab_order: Vec::new(),
            active_file: None,
            multi_cursor: MultiCursorEngine::new(),
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.tab_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab_order.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.open_files.contains_key(path)
    }

    pub fn tab_order(&self) -> &[PathBuf] {
        &self.tab_order
    }

    /// Open files in tab order
    pub fn files(&self) -> impl Iterator<Item = &OpenFile> {
        self.tab_order.iter().filter_map(|p| self.open_files.get(p))
    }

    /// Open files in no particular order
    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut OpenFile> {
        self.open_files.values_mut()
    }

    pub fn file(&self, path: &Path) -> Option<&OpenFile> {
        self.open_files.get(path)
    }

    pub fn active_file(&self) -> Option<&Path> {
        self.active_file.as_deref()
    }

    pub fn active(&self) -> Option<&OpenFile> {
        self.active_file.as_ref().and_then(|p| self.open_files.get(p))
    }

    pub fn active_mut(&mut self) -> Option<&mut OpenFile> {
        let path = self.active_file.as_ref()?;
        self.open_files.get_mut(path)
    }

    /// The active document together with this pane's multi-cursor engine
    pub fn active_with_cursor(&mut self) -> Option<(&mut OpenFile, &mut MultiCursorEngine)> {
        let path = self.active_file.as_ref()?;
        let file = self.open_files.get_mut(path)?;
        Some((file, &mut self.multi_cursor))
    }

    /// Index of the active tab
    pub fn active_index(&self) -> Option<usize> {
        let active = self.active_file.as_ref()?;
        self.tab_order.iter().position(|p| p == active)
    }

    /// Add a file and focus it. Reopening an open path only refocuses it.
    pub fn add_file(&mut self, file: OpenFile) {
        let path = file.path().to_path_buf();
        if !self.open_files.contains_key(&path) {
            self.tab_order.push(path.clone());
            self.open_files.insert(path.clone(), file);
        }
        self.set_active(Some(path));
    }

    /// Close a tab and return the tab that is active afterwards.
    ///
    /// Closing the active tab at index `i` activates the tab that now sits
    /// at `min(i, len - 1)`, or nothing if the pane became empty. Closing
    /// any other tab keeps the current one.
    pub fn remove_file(&mut self, path: &Path) -> Option<PathBuf> {
        self.take_file(path);
        self.active_file.clone()
    }

    /// Like [`remove_file`](Self::remove_file) but hands back the closed document
    pub fn take_file(&mut self, path: &Path) -> Option<OpenFile> {
        let file = self.open_files.remove(path)?;
        let index = self.tab_order.iter().position(|p| p == path)?;
        self.tab_order.remove(index);

        if self.active_file.as_deref() == Some(path) {
            let next = if self.tab_order.is_empty() {
                None
            } else {
                Some(self.tab_order[index.min(self.tab_order.len() - 1)].clone())
            };
            self.set_active(next);
        }
        Some(file)
    }

    /// Focus an open file; returns false if the path is not open here
    pub fn activate(&mut self, path: &Path) -> bool {
        if !self.open_files.contains_key(path) {
            return false;
        }
        self.set_active(Some(path.to_path_buf()));
        true
    }

    /// Cyclic successor of the active tab
    pub fn get_next_file(&self) -> Option<&Path> {
        if self.tab_order.is_empty() {
            return None;
        }
        let next = match self.active_index() {
            Some(i) => (i + 1) % self.tab_order.len(),
            None => 0,
        };
        Some(&self.tab_order[next])
    }

    /// Cyclic predecessor of the active tab
    pub fn get_prev_file(&self) -> Option<&Path> {
        let len = self.tab_order.len();
        if len == 0 {
            return None;
        }
        let prev = match self.active_index() {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        Some(&self.tab_order[prev])
    }

    /// Tab at a 0-based index
    pub fn get_file_at_index(&self, index: usize) -> Option<&Path> {
        self.tab_order.get(index).map(PathBuf::as_path)
    }

    fn set_active(&mut self, path: Option<PathBuf>) {
        if self.active_file != path {
            // Highlights refer to the previous document
            self.multi_cursor.cancel();
        }
        self.active_file = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn pane_with(names: &[&str]) -> EditorPane {
        let mut pane = EditorPane::new(1);
        for name in names {
            pane.add_file(OpenFile::new(*name, ""));
        }
        pane
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn test_add_file_refocuses_existing() {
        let mut pane = pane_with(&["a", "b"]);
        pane.add_file(OpenFile::new("a", "changed"));
        assert_eq!(pane.tab_order(), &[path("a"), path("b")]);
        assert_eq!(pane.active_file(), Some(Path::new("a")));
        // The already open document is kept
        assert_eq!(pane.file(Path::new("a")).map(|f| f.content()), Some(String::new()));
    }

    #[test]
    fn test_remove_active_middle_tab_clamps() {
        let mut pane = pane_with(&["a", "b", "c"]);
        pane.activate(Path::new("b"));
        assert_eq!(pane.remove_file(Path::new("b")), Some(path("c")));
        assert_eq!(pane.active_file(), Some(Path::new("c")));
    }

    #[test]
    fn test_remove_active_last_tab_moves_left() {
        let mut pane = pane_with(&["a", "b", "c"]);
        assert_eq!(pane.remove_file(Path::new("c")), Some(path("b")));
    }

    #[test]
    fn test_remove_inactive_keeps_active() {
        let mut pane = pane_with(&["a", "b", "c"]);
        assert_eq!(pane.remove_file(Path::new("a")), Some(path("c")));
        assert_eq!(pane.tab_order(), &[path("b"), path("c")]);
    }

    #[test]
    fn test_remove_only_tab() {
        let mut pane = pane_with(&["a"]);
        assert_eq!(pane.remove_file(Path::new("a")), None);
        assert!(pane.is_empty());
        assert_eq!(pane.active_file(), None);
    }

    #[test]
    fn test_next_prev_cycle() {
        let mut pane = pane_with(&["a", "b", "c"]);
        pane.activate(Path::new("a"));
        assert_eq!(pane.get_next_file(), Some(Path::new("b")));
        assert_eq!(pane.get_prev_file(), Some(Path::new("c")));
        assert_eq!(EditorPane::new(2).get_next_file(), None);
    }

    #[test]
    fn test_file_at_index_bounds() {
        let pane = pane_with(&["a", "b"]);
        assert_eq!(pane.get_file_at_index(1), Some(Path::new("b")));
        assert_eq!(pane.get_file_at_index(2), None);
    }

    #[test]
    fn test_switching_tabs_cancels_multi_select() {
        let mut pane = pane_with(&["a", "b"]);
        if let Some((file, engine)) = pane.active_with_cursor() {
            file.buffer.set_text("foo foo");
            engine.select_next_match(&mut file.buffer);
        }
        assert!(pane.multi_cursor.is_active());
        pane.activate(Path::new("a"));
        assert!(!pane.multi_cursor.is_active());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u8..8).prop_map(Op::Add), (0u8..8).prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn test_tab_set_invariant(ops in prop::collection::vec(op(), 0..64)) {
            let mut pane = EditorPane::new(1);
            for op in ops {
                match op {
                    Op::Add(n) => pane.add_file(OpenFile::new(format!("f{}", n), "")),
                    Op::Remove(n) => {
                        let before = pane.tab_order().to_vec();
                        let was_active = pane.active_index();
                        let target = path(&format!("f{}", n));
                        let next = pane.remove_file(&target);
                        if let Some(i) = before.iter().position(|p| *p == target) {
                            if was_active == Some(i) {
                                let expected = if before.len() == 1 {
                                    None
                                } else {
                                    Some(pane.tab_order()[i.min(before.len() - 2)].clone())
                                };
                                prop_assert_eq!(next, expected);
                            }
                        }
                    }
                }

                let order: HashSet<&PathBuf> = pane.tab_order().iter().collect();
                let keys: HashSet<&PathBuf> = pane.open_files.keys().collect();
                prop_assert_eq!(order.len(), pane.tab_order().len());
                prop_assert_eq!(&order, &keys);
                match pane.active_file() {
                    Some(active) => prop_assert!(pane.contains(active)),
                    None => prop_assert!(pane.is_empty()),
                }
            }
        }

        #[test]
        fn test_next_then_prev_cycles_to_identity(n in 1usize..10, start in 0usize..10) {
            let mut pane = EditorPane::new(1);
            for i in 0..n {
                pane.add_file(OpenFile::new(format!("f{}", i), ""));
            }
            let start = path(&format!("f{}", start % n));
            pane.activate(&start);

            for _ in 0..n {
                let next = pane.get_next_file().map(Path::to_path_buf);
                if let Some(next) = next {
                    pane.activate(&next);
                }
            }
            prop_assert_eq!(pane.active_file(), Some(start.as_path()));

            for _ in 0..n {
                let prev = pane.get_prev_file().map(Path::to_path_buf);
                if let Some(prev) = prev {
                    pane.activate(&prev);
                }
            }
            prop_assert_eq!(pane.active_file(), Some(start.as_path()));
        }
    }
}
