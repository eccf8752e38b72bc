//! Addressing nodes inside a move tree.
//!
//! A path alternates line indices and variation indices:
//! `[main-index, variation, index, variation, index, ...]`. A path of odd
//! length names a node; `[4]` is the fifth main-line move and `[4, 0, 1]` is
//! the second move of that move's first variation.

use crate::tree::{Game, MoveNode};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn main(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Index of the node within its own line.
    pub fn index(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    /// How many variations deep the node sits; 0 for the main line.
    pub fn depth(&self) -> usize {
        self.0.len() / 2
    }

    fn with_index(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        }
        Self(indices)
    }

    /// First node of variation `variation` hanging off this node.
    pub fn child(&self, variation: usize) -> Self {
        let mut indices = self.0.clone();
        indices.extend([variation, 0]);
        Self(indices)
    }

    /// The node this path's line is a variation of.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() < 3 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 2].to_vec()))
    }
}

impl Game {
    pub fn node_at(&self, path: &NodePath) -> Option<&MoveNode> {
        let line = self.line_at(path)?;
        line.get(path.index())
    }

    /// The line containing the addressed node.
    pub fn line_at(&self, path: &NodePath) -> Option<&[MoveNode]> {
        let indices = path.indices();
        if indices.len() % 2 == 0 {
            return None;
        }
        let mut line: &[MoveNode] = &self.moves;
        for step in indices[..indices.len() - 1].chunks(2) {
            line = line.get(step[0])?.variations.get(step[1])?;
        }
        Some(line)
    }

    pub fn next_node(&self, path: &NodePath) -> Option<NodePath> {
        let line = self.line_at(path)?;
        let next = path.index() + 1;
        (next < line.len()).then(|| path.with_index(next))
    }

    pub fn previous_node(&self, path: &NodePath) -> Option<NodePath> {
        self.line_at(path)?;
        path.index().checked_sub(1).map(|prev| path.with_index(prev))
    }

    pub fn line_end(&self, path: &NodePath) -> Option<NodePath> {
        let line = self.line_at(path)?;
        line.len().checked_sub(1).map(|last| path.with_index(last))
    }

    pub fn line_start(&self, path: &NodePath) -> Option<NodePath> {
        self.line_at(path)?;
        Some(path.with_index(0))
    }

    /// First move of the first variation of the addressed node.
    pub fn enter_variation(&self, path: &NodePath) -> Option<NodePath> {
        let node = self.node_at(path)?;
        (!node.variations.is_empty()).then(|| path.child(0))
    }

    /// Jump to the neighbouring variation of the same parent node.
    pub fn sibling_variation(&self, path: &NodePath, forward: bool) -> Option<NodePath> {
        let parent = path.parent()?;
        let count = self.node_at(&parent)?.variations.len();
        let current = path.indices()[path.indices().len() - 2];
        let target = if forward {
            current + 1
        } else {
            current.checked_sub(1)?
        };
        (target < count).then(|| parent.child(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_games;

    fn sample() -> Game {
        let mut games = parse_games("1. e4 e5 (1... c5 2. Nf3 (2. c3) d6) (1... e6) 2. Nf3 Nc6\n");
        games.remove(0)
    }

    fn notation(game: &Game, indices: &[usize]) -> Option<String> {
        game.node_at(&NodePath::from_indices(indices.to_vec()))
            .map(|node| node.notation.clone())
    }

    #[test]
    fn test_node_at() {
        let game = sample();
        assert_eq!(notation(&game, &[0]).as_deref(), Some("e4"));
        assert_eq!(notation(&game, &[1, 0, 0]).as_deref(), Some("c5"));
        assert_eq!(notation(&game, &[1, 0, 1, 0, 0]).as_deref(), Some("c3"));
        assert_eq!(notation(&game, &[1, 1, 0]).as_deref(), Some("e6"));
        assert_eq!(notation(&game, &[1, 2, 0]), None);
        assert_eq!(notation(&game, &[9]), None);
        assert_eq!(notation(&game, &[1, 0]), None);
        assert_eq!(notation(&game, &[]), None);
    }

    #[test]
    fn test_walk_a_line() {
        let game = sample();
        let start = NodePath::main(0);
        let next = game.next_node(&start).unwrap();
        assert_eq!(next, NodePath::main(1));
        assert_eq!(game.previous_node(&next), Some(start.clone()));
        assert_eq!(game.previous_node(&start), None);
        assert_eq!(game.line_end(&start), Some(NodePath::main(3)));
        assert_eq!(game.next_node(&NodePath::main(3)), None);
    }

    #[test]
    fn test_enter_and_leave_variations() {
        let game = sample();
        assert_eq!(game.enter_variation(&NodePath::main(0)), None);

        let inside = game.enter_variation(&NodePath::main(1)).unwrap();
        assert_eq!(inside.indices(), &[1, 0, 0]);
        assert_eq!(inside.depth(), 1);
        assert_eq!(inside.parent(), Some(NodePath::main(1)));
        assert_eq!(NodePath::main(1).parent(), None);

        let sibling = game.sibling_variation(&inside, true).unwrap();
        assert_eq!(sibling.indices(), &[1, 1, 0]);
        assert_eq!(game.sibling_variation(&sibling, true), None);
        assert_eq!(game.sibling_variation(&sibling, false), Some(inside.clone()));
        assert_eq!(game.sibling_variation(&NodePath::main(1), true), None);
    }
}
