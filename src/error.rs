
use thiserror::Error;

use crate::{Item, Count};
use crate::fptree::NodeId;

/// Everything that can go wrong while building, mining or persisting structures.
#[derive( Debug, Error )]
pub enum MineError {
    #[error( "item {item} occurs more than once in one transaction" )]
    DuplicateItem { item: Item },

    #[error( "node {node} of item {item} cannot be reached from the head of its chain" )]
    BrokenChain { node: NodeId, item: Item },

    #[error( "node {node} is already linked into the header table" )]
    AlreadyLinked { node: NodeId },

    #[error( "node {0} does not carry an item" )]
    MissingItem( NodeId ),

    #[error( "node {0} is not part of the tree" )]
    UnknownNode( NodeId ),

    #[error( "count {count} of node {node} is below the count {child_count} of its child" )]
    CountViolation { node: NodeId, count: Count, child_count: Count },

    #[error( "walking up from node {0} did not arrive at the root" )]
    DetachedNode( NodeId ),

    #[error( "item {0} has no hyperlink chain" )]
    UnknownItem( Item ),

    #[error( "row {row} of the hyperlinked database is not in canonical order" )]
    UnorderedRow { row: usize },

    #[error( "code {0} is not known to the encoder" )]
    UnknownCode( Item ),

    #[error( "support of {0} was never computed" )]
    NotFound( String ),

    #[error( "itemset {itemset} occurs in {expected} transactions but was mined with support {mined}" )]
    SupportMismatch { itemset: String, expected: Count, mined: Count },

    #[error( "checkpoint record {index} is malformed: {reason}" )]
    Checkpoint { index: usize, reason: String },

    #[error( "invalid configuration: {0}" )]
    Config( String ),

    #[error( transparent )]
    Io( #[from] std::io::Error ),

    #[error( transparent )]
    Json( #[from] serde_json::Error ),
}

pub type Result<T> = std::result::Result<T, MineError>;
