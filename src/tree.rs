use std::collections::HashMap;

use log::debug;

use crate::model::{ConnectorType, Node};

/// Resolves every `parent_id` into a `parent` index. Nodes whose parent id
/// matches no other node, or whose ancestry would loop back onto itself,
/// are demoted to roots.
pub fn resolve_parents(nodes: &mut [Node]) {
    let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        by_id.entry(node.id.as_str()).or_insert(idx);
    }
    let resolved: Vec<Option<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            node.parent_id
                .as_deref()
                .and_then(|parent| by_id.get(parent).copied())
                .filter(|parent| *parent != idx)
        })
        .collect();

    for (node, parent) in nodes.iter_mut().zip(resolved) {
        node.parent = parent;
        if parent.is_none() && node.parent_id.is_some() {
            debug!("node '{}' has no parent '{:?}', demoted to root", node.id, node.parent_id);
            demote(node);
        }
    }

    break_cycles(nodes);
}

fn demote(node: &mut Node) {
    node.parent = None;
    node.parent_id = None;
    node.connector = ConnectorType::Under;
}

fn break_cycles(nodes: &mut [Node]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; nodes.len()];
    let mut path: Vec<usize> = Vec::new();
    for start in 0..nodes.len() {
        path.clear();
        let mut cur = start;
        loop {
            match state[cur] {
                DONE => break,
                ON_PATH => {
                    if let Some(&last) = path.last() {
                        debug!("node '{}' closes a parent cycle, demoted to root", nodes[last].id);
                        demote(&mut nodes[last]);
                    }
                    break;
                }
                _ => {
                    state[cur] = ON_PATH;
                    path.push(cur);
                    match nodes[cur].parent {
                        Some(parent) => cur = parent,
                        None => break,
                    }
                }
            }
        }
        for &idx in &path {
            state[idx] = DONE;
        }
    }
}

/// Appends each node to its parent's under/left/right list in add order.
pub fn classify_siblings(nodes: &mut [Node]) {
    for idx in 0..nodes.len() {
        let Some(parent) = nodes[idx].parent else {
            continue;
        };
        match nodes[idx].connector {
            ConnectorType::Under => nodes[parent].under.push(idx),
            ConnectorType::Left => nodes[parent].left.push(idx),
            ConnectorType::Right => nodes[parent].right.push(idx),
        }
    }
}

pub fn root_of(nodes: &[Node], mut idx: usize) -> usize {
    while let Some(parent) = nodes[idx].parent {
        idx = parent;
    }
    idx
}

/// First node on the way up (starting with `idx`) that is an under-child
/// or a root.
pub fn under_parent(nodes: &[Node], mut idx: usize) -> usize {
    loop {
        let node = &nodes[idx];
        match node.parent {
            Some(parent) if node.connector != ConnectorType::Under => idx = parent,
            _ => return idx,
        }
    }
}

/// True when `idx` is `ancestor` or lies in its subtree.
pub fn is_within(nodes: &[Node], idx: usize, ancestor: usize) -> bool {
    let mut cur = Some(idx);
    while let Some(node) = cur {
        if node == ancestor {
            return true;
        }
        cur = nodes[node].parent;
    }
    false
}

/// Children of `idx` in traversal order: under, then left, then right.
pub fn children(nodes: &[Node], idx: usize) -> impl Iterator<Item = usize> + '_ {
    let node = &nodes[idx];
    node.under
        .iter()
        .chain(node.left.iter())
        .chain(node.right.iter())
        .copied()
}
