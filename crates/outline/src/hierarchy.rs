//! Folding a flat, document-ordered section list into a tree.

use crate::types::Section;

/// Nest `flat` (document order, no children) by heading level.
///
/// A section becomes the last child of the nearest preceding section with a
/// strictly smaller level, or a top-level section if there is none.
pub fn build_hierarchy(flat: Vec<Section>) -> Vec<Section> {
    let len = flat.len();
    let mut child_indices: Vec<Vec<usize>> = vec![Vec::new(); len];
    let mut roots = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for (idx, section) in flat.iter().enumerate() {
        while let Some(&top) = stack.last() {
            if flat[top].level < section.level {
                break;
            }
            stack.pop();
        }

        match stack.last() {
            Some(&parent) => child_indices[parent].push(idx),
            None => roots.push(idx),
        }
        stack.push(idx);
    }

    // Children always follow their parent, so a reverse pass finishes every
    // subtree before its parent needs it.
    let mut slots: Vec<Option<Section>> = flat.into_iter().map(Some).collect();
    for idx in (0..len).rev() {
        let children: Vec<Section> = child_indices[idx]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(section) = slots[idx].as_mut() {
            section.children = children;
        }
    }

    roots
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}
