
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Item, Count};
use crate::error::{MineError, Result};

use super::{Tree, NodeId, ROOT};

/// One node of a checkpoint. Parents are referred to by their position in the record list,
/// which always lies before the child.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct NodeRecord {
    pub item: Option<Item>,
    pub count: Count,
    pub parent: Option<usize>,
}

impl Tree {

    /// Live nodes in preorder, root first, children in insertion order
    pub fn records( &self ) -> Vec<NodeRecord> {
	let mut position: Vec<Option<usize>> = vec!( None; self.nodes.len() );
	let mut records = Vec::with_capacity( self.node_count() + 1 );
	let mut stack: Vec<NodeId> = vec!( ROOT );
	while let Some( id ) = stack.pop() {
	    let node = &self.nodes[ id ];
	    position[ id ] = Some( records.len() );
	    records.push( NodeRecord {
		item: node.item,
		count: node.count,
		parent: node.parent.and_then( |parent| position[ parent ] ),
	    });
	    stack.extend( node.children.iter().rev() );
	}
	records
    }

    /// Encodes the tree as one JSON record per line
    pub fn serialize( &self ) -> Result<Vec<u8>> {
	let mut bytes = Vec::new();
	for record in self.records() {
	    serde_json::to_writer( &mut bytes, &record )?;
	    bytes.push( b'\n' );
	}
	Ok( bytes )
    }

    /// Rebuilds a tree from preorder records. Chains are relinked in record order.
    pub fn from_records( records: &[NodeRecord] ) -> Result<Tree> {
	let malformed = |index: usize, reason: &str| MineError::Checkpoint { index, reason: reason.to_string() };

	let Some( (root, rest) ) = records.split_first() else {
	    return Err( malformed( 0, "no root record" ));
	};
	if root.item.is_some() || root.parent.is_some() {
	    return Err( malformed( 0, "first record is not a root" ));
	}

	let mut tree = Tree::new();
	tree.nodes[ ROOT ].count = root.count;
	// record position -> node handle
	let mut handles: Vec<NodeId> = vec!( ROOT );
	for (offset, record) in rest.iter().enumerate() {
	    let index = offset + 1;
	    let item = record.item.ok_or_else( || malformed( index, "node without item" ))?;
	    let parent = record.parent
		.filter( |parent| *parent < index )
		.ok_or_else( || malformed( index, "parent does not precede the node" ))?;
	    if record.count > records[ parent ].count {
		return Err( MineError::CountViolation { node: handles[ parent ], count: records[ parent ].count, child_count: record.count } );
	    }
	    let parent = handles[ parent ];
	    if tree.child( parent, item ).is_some() {
		return Err( malformed( index, "repeated item below one parent" ));
	    }
	    let node = tree.push_node( item, record.count, parent );
	    tree.link_into_header_table( node )?;
	    handles.push( node );
	}
	debug!( "rebuilt tree of {} nodes", tree.node_count() );
	Ok( tree )
    }

    pub fn rebuild_from_file<P: AsRef<Path>>( path: P ) -> Result<Tree> {
	let records = read_nodes_from_file( path )?;
	Tree::from_records( &records )
    }
}

pub fn write_to_file<P: AsRef<Path>>( path: P, bytes: &[u8] ) -> Result<()> {
    let mut file = File::create( path.as_ref() )?;
    file.write_all( bytes )?;
    info!( "wrote checkpoint of {} bytes to {}", bytes.len(), path.as_ref().display() );
    Ok( () )
}

/// Reads the records written by `Tree::serialize`. Blank lines are skipped.
pub fn read_nodes_from_file<P: AsRef<Path>>( path: P ) -> Result<Vec<NodeRecord>> {
    let reader = BufReader::new( File::open( path )? );
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
	let line = line?;
	if line.trim().is_empty() {
	    continue;
	}
	let record = serde_json::from_str( &line )
	    .map_err( |err| MineError::Checkpoint { index, reason: err.to_string() } )?;
	records.push( record );
    }
    Ok( records )
}

#[cfg(test)]
mod test {

    use super::*;

    fn sample_tree() -> Tree {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ 0, 1, 2 ] ).unwrap();
	tree.insert_ordered_transaction( &[ 0, 2 ] ).unwrap();
	tree.insert_ordered_transaction( &[ 1, 2 ] ).unwrap();
	tree.insert_ordered_transaction( &[ 0, 1 ] ).unwrap();
	tree
    }

    #[test]
    fn round_trip_is_byte_identical() {
	let tree = sample_tree();
	let bytes = tree.serialize().unwrap();

	let path = std::env::temp_dir().join( format!( "fpmine-tree-{}.jsonl", std::process::id() ));
	write_to_file( &path, &bytes ).unwrap();
	let rebuilt = Tree::rebuild_from_file( &path ).unwrap();
	std::fs::remove_file( &path ).unwrap();

	assert_eq!( rebuilt.serialize().unwrap(), bytes );
	assert_eq!( rebuilt.transaction_count(), 4 );
	assert_eq!( rebuilt.node_count(), tree.node_count() );
	for item in 0 .. 3 {
	    assert_eq!( rebuilt.chain_support( item ), tree.chain_support( item ));
	    assert_eq!( rebuilt.chain( item ).count(), tree.chain( item ).count() );
	}
	assert!( rebuilt.check_chains().is_ok() );
    }

    #[test]
    fn records_are_preorder() {
	let records = sample_tree().records();
	let items: Vec<Option<Item>> = records.iter().map( |r| r.item ).collect();
	assert_eq!( items, vec!( None, Some( 0 ), Some( 1 ), Some( 2 ), Some( 2 ), Some( 1 ), Some( 2 )));
	assert_eq!( records[3].parent, Some( 2 ));
	assert_eq!( records[5].parent, Some( 0 ));
    }

    #[test]
    fn rejects_bad_records() {
	assert!( Tree::from_records( &[] ).is_err() );

	let orphan = vec!(
	    NodeRecord { item: None, count: 1, parent: None },
	    NodeRecord { item: Some( 4 ), count: 1, parent: Some( 3 ) },
	);
	assert!( matches!( Tree::from_records( &orphan ), Err( MineError::Checkpoint { index: 1, .. } )));
    }

    #[test]
    fn child_above_parent_count_is_rejected() {
	let inflated = vec!(
	    NodeRecord { item: None, count: 2, parent: None },
	    NodeRecord { item: Some( 0 ), count: 2, parent: Some( 0 ) },
	    NodeRecord { item: Some( 1 ), count: 3, parent: Some( 1 ) },
	);
	assert!( matches!( Tree::from_records( &inflated ), Err( MineError::CountViolation { count: 2, child_count: 3, .. } )));

	let above_root = vec!(
	    NodeRecord { item: None, count: 1, parent: None },
	    NodeRecord { item: Some( 0 ), count: 4, parent: Some( 0 ) },
	);
	assert!( matches!( Tree::from_records( &above_root ), Err( MineError::CountViolation { .. } )));
    }

    #[test]
    fn missing_file_is_an_io_error() {
	let path = std::env::temp_dir().join( "fpmine-no-such-checkpoint.jsonl" );
	assert!( matches!( read_nodes_from_file( &path ), Err( MineError::Io( _ ))));
    }
}
