
mod serialize; // checkpointing of trees

use std::cmp::Reverse;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, Level};

use crate::{Item, Count, Loggable, log_at};
use crate::data::ValueMap;
use crate::error::{MineError, Result};

pub use serialize::{NodeRecord, write_to_file, read_nodes_from_file};

/// Handle of a node inside the tree's arena
pub type NodeId = usize;

/// The root sentinel always occupies the first slot
pub const ROOT: NodeId = 0;

#[derive( Debug, Clone )]
pub struct Node {
    /// None only for the root
    item: Option<Item>,
    /// number of transactions whose path passes through this node
    count: Count,
    parent: Option<NodeId>,
    /// invariant: insertion order, no two children share an item
    children: Vec<NodeId>,
    /// next node carrying the same item
    aux: Option<NodeId>,
    linked: bool,
    /// retired nodes keep their slot but are unreachable
    alive: bool,
}

#[derive( Debug, Clone, Copy )]
struct ChainEnds {
    head: NodeId,
    tail: NodeId,
}

/// Prefix-sharing tree over ordered transactions.
///
/// Nodes live in an arena and refer to each other by handle. Every item has a chain that threads all of its nodes,
/// from the first one inserted (head) to the last (tail), so all occurrences of an item can be visited without a search.
#[derive( Debug, Clone )]
pub struct Tree {
    nodes: Vec<Node>,
    /// (parent, item) -> child
    edges: FxHashMap<(NodeId, Item), NodeId>,
    header: FxHashMap<Item, ChainEnds>,
    /// items in the order they entered the header table
    header_order: Vec<Item>,
    /// running supports, only kept by the self-ordering insertion
    counts: FxHashMap<Item, Count>,
    /// support -> items in the order they reached that support
    groups: ValueMap<Count, Item>,
}

impl Node {

    fn new( item: Option<Item>, count: Count, parent: Option<NodeId> ) -> Node {
	Node {
	    item,
	    count,
	    parent,
	    children: Vec::new(),
	    aux: None,
	    linked: false,
	    alive: true,
	}
    }

    pub fn item( &self ) -> Option<Item> { self.item }
    pub fn count( &self ) -> Count { self.count }
    pub fn parent( &self ) -> Option<NodeId> { self.parent }
    pub fn children( &self ) -> &[NodeId] { &self.children }
    pub fn aux( &self ) -> Option<NodeId> { self.aux }
}

impl Tree {

    pub fn new() -> Tree {
	Tree {
	    nodes: vec!( Node::new( None, 0, None )),
	    edges: FxHashMap::default(),
	    header: FxHashMap::default(),
	    header_order: Vec::new(),
	    counts: FxHashMap::default(),
	    groups: ValueMap::new(),
	}
    }

    pub fn node( &self, id: NodeId ) -> Result<&Node> {
	match self.nodes.get( id ) {
	    Some( node ) if node.alive => Ok( node ),
	    _ => Err( MineError::UnknownNode( id )),
	}
    }

    pub fn child( &self, parent: NodeId, item: Item ) -> Option<NodeId> {
	self.edges.get( &(parent, item) ).copied()
    }

    /// Number of transactions inserted
    pub fn transaction_count( &self ) -> Count {
	self.nodes[ ROOT ].count
    }

    /// Number of live nodes, not counting the root
    pub fn node_count( &self ) -> usize {
	self.nodes.iter().skip( 1 ).filter( |node| node.alive ).count()
    }

    /// Items with at least one node, in the order they entered the tree
    pub fn header_items( &self ) -> &[Item] {
	&self.header_order
    }

    pub fn head( &self, item: Item ) -> Option<NodeId> {
	self.header.get( &item ).map( |ends| ends.head )
    }

    pub fn tail( &self, item: Item ) -> Option<NodeId> {
	self.header.get( &item ).map( |ends| ends.tail )
    }

    /// Visits the nodes of an item from head to tail
    pub fn chain( &self, item: Item ) -> impl Iterator<Item = NodeId> + '_ {
	std::iter::successors( self.head( item ), move |id| self.nodes[ *id ].aux )
    }

    /// Sum of the counts along the item's chain
    pub fn chain_support( &self, item: Item ) -> Count {
	self.chain( item ).map( |id| self.nodes[ id ].count ).sum()
    }

    /// Items on the path from the root down to the node, excluding the node itself
    pub fn prefix_path( &self, node: NodeId ) -> Result<Vec<Item>> {
	let mut path = Vec::new();
	let mut current = self.node( node )?.parent;
	while let Some( id ) = current {
	    let ancestor = &self.nodes[ id ];
	    if let Some( item ) = ancestor.item {
		path.push( item );
	    }
	    current = ancestor.parent;
	}
	path.reverse();
	Ok( path )
    }

    /// Inserts one transaction whose items are already in canonical order.
    /// Shared prefixes are merged, new nodes are linked into the header table.
    pub fn insert_ordered_transaction( &mut self, items: &[Item] ) -> Result<()> {
	self.insert_weighted( items, 1 )
    }

    /// Inserts a canonically ordered transaction that occurred `weight` times
    pub fn insert_weighted( &mut self, items: &[Item], weight: Count ) -> Result<()> {
	check_distinct( items )?;
	self.nodes[ ROOT ].count += weight;
	self.insert_below( ROOT, items, weight )
    }

    /// Inserts a transaction in any order. The order is derived from the supports the tree has seen so far:
    /// higher support first, equal supports in the order the items reached them.
    /// If an item overtakes others, the parts of the tree that now violate the order are rebuilt,
    /// so afterwards every path follows the current order again.
    pub fn insert_and_order_transaction( &mut self, items: &[Item] ) -> Result<()> {
	check_distinct( items )?;

	let mut ordered = items.to_vec();
	ordered.sort_by_key( |item| self.online_key( *item ));
	for item in &ordered {
	    self.promote( *item )?;
	}
	ordered.sort_by_key( |item| self.online_key( *item ));

	trace!( "self-ordered insertion of {:?}", ordered );
	self.nodes[ ROOT ].count += 1;
	self.insert_below( ROOT, &ordered, 1 )
    }

    /// Items ordered by the supports seen by `insert_and_order_transaction`
    pub fn online_order( &self ) -> Vec<Item> {
	let mut items: Vec<Item> = self.counts.keys().copied().collect();
	items.sort_by_key( |item| self.online_key( *item ));
	items
    }

    /// Appends a node to the chain of its item. The first node of an item becomes head and tail,
    /// later ones are attached behind the current tail.
    pub fn link_into_header_table( &mut self, node: NodeId ) -> Result<()> {
	let target = self.node( node )?;
	let item = target.item.ok_or( MineError::MissingItem( node ))?;
	if target.linked {
	    return Err( MineError::AlreadyLinked { node } );
	}

	match self.header.get_mut( &item ) {
	    None => {
		self.header.insert( item, ChainEnds { head: node, tail: node } );
		self.header_order.push( item );
	    },
	    Some( ends ) => {
		self.nodes[ ends.tail ].aux = Some( node );
		ends.tail = node;
	    }
	}
	let target = &mut self.nodes[ node ];
	target.aux = None;
	target.linked = true;
	Ok( () )
    }

    /// Walks up from `start` towards the root and returns the ancestor farthest from `start`
    /// whose item is listed in `path`, together with the number of edges walked to reach it.
    /// Returns `(None, 0)` if no ancestor matches.
    pub fn find_farthest_ancestor( &self, start: NodeId, path: &[Item] ) -> Result<(Option<NodeId>, usize)> {
	let mut child_count = self.node( start )?.count;
	if start == ROOT {
	    return Ok( (None, 0) );
	}

	let mut farthest = (None, 0);
	let mut distance = 0;
	let mut current = self.nodes[ start ].parent;
	while let Some( id ) = current {
	    if id == ROOT {
		return Ok( farthest );
	    }
	    let ancestor = &self.nodes[ id ];
	    distance += 1;
	    if ancestor.count < child_count {
		return Err( MineError::CountViolation { node: id, count: ancestor.count, child_count } );
	    }
	    if ancestor.item.map_or( false, |item| path.contains( &item )) {
		farthest = (Some( id ), distance);
	    }
	    child_count = ancestor.count;
	    current = ancestor.parent;
	}
	Err( MineError::DetachedNode( start ))
    }

    /// Returns the node right before `node` in its item's chain, or None if `node` is the head.
    /// Fails if `node` cannot be reached from the head of its own chain.
    pub fn previous_in_chain( &self, node: NodeId ) -> Result<Option<NodeId>> {
	let item = self.node( node )?.item.ok_or( MineError::MissingItem( node ))?;
	let broken = MineError::BrokenChain { node, item };
	let Some( ends ) = self.header.get( &item ) else {
	    return Err( broken );
	};
	if ends.head == node {
	    return Ok( None );
	}

	let mut previous = ends.head;
	// a chain can never be longer than the arena, so this also stops on cycles
	for _ in 0 .. self.nodes.len() {
	    match self.nodes[ previous ].aux {
		Some( next ) if next == node => return Ok( Some( previous )),
		Some( next ) => previous = next,
		None => break,
	    }
	}
	Err( broken )
    }

    /// Takes the item out of the group of items that reached `key`, returning the rest of that group
    pub fn remove_from_group( &mut self, key: Count, item: Item ) -> Vec<Item> {
	self.groups.remove_from_group( &key, &item )
    }

    /// Verifies that every live node is reachable from the head of its chain exactly once
    /// and that chains only hold live nodes of their item.
    /// For trees built by self-ordering insertion, chain sums must also equal the running supports.
    pub fn check_chains( &self ) -> Result<()> {
	let mut seen: FxHashSet<NodeId> = FxHashSet::default();
	for item in &self.header_order {
	    let ends = self.header.get( item ).ok_or( MineError::UnknownItem( *item ))?;
	    let mut last = ends.head;
	    for id in self.chain( *item ) {
		let node = &self.nodes[ id ];
		if !node.alive || node.item != Some( *item ) || !seen.insert( id ) {
		    return Err( MineError::BrokenChain { node: id, item: *item } );
		}
		last = id;
	    }
	    if last != ends.tail {
		return Err( MineError::BrokenChain { node: ends.tail, item: *item } );
	    }
	    if let Some( count ) = self.counts.get( item ) {
		let support = self.chain_support( *item );
		if support != *count {
		    return Err( MineError::CountViolation { node: ends.head, count: support, child_count: *count } );
		}
	    }
	}

	for (id, node) in self.nodes.iter().enumerate().skip( 1 ) {
	    if node.alive && !seen.contains( &id ) {
		let item = node.item.ok_or( MineError::MissingItem( id ))?;
		return Err( MineError::BrokenChain { node: id, item } );
	    }
	}
	Ok( () )
    }

    fn insert_below( &mut self, anchor: NodeId, items: &[Item], weight: Count ) -> Result<()> {
	let mut current = anchor;
	for item in items {
	    current = match self.child( current, *item ) {
		Some( child ) => {
		    self.nodes[ child ].count += weight;
		    child
		},
		None => {
		    let child = self.push_node( *item, weight, current );
		    self.link_into_header_table( child )?;
		    child
		}
	    };
	}
	Ok( () )
    }

    fn push_node( &mut self, item: Item, count: Count, parent: NodeId ) -> NodeId {
	let id = self.nodes.len();
	self.nodes.push( Node::new( Some( item ), count, Some( parent )));
	self.nodes[ parent ].children.push( id );
	self.edges.insert( (parent, item), id );
	id
    }

    fn online_key( &self, item: Item ) -> (Reverse<Count>, usize) {
	match self.counts.get( &item ) {
	    Some( count ) => {
		let position = self.groups.position( count, &item ).unwrap_or( usize::MAX );
		(Reverse( *count ), position)
	    },
	    None => (Reverse( 0 ), usize::MAX),
	}
    }

    /// Raises the running support of the item by one and repairs the tree if it overtook other items
    fn promote( &mut self, item: Item ) -> Result<()> {
	let old = self.counts.get( &item ).copied().unwrap_or( 0 );
	let losers = if old > 0 { self.remove_from_group( old, item ) } else { Vec::new() };
	self.counts.insert( item, old + 1 );
	self.groups.insert( old + 1, item );

	if losers.is_empty() {
	    Ok( () )
	} else {
	    self.reconstruct( item, &losers )
	}
    }

    /// Moves every occurrence of `winner` that sits below one of the `losers` above them.
    /// The transactions through such a node are lifted out below the farthest loser and inserted again in the current order.
    fn reconstruct( &mut self, winner: Item, losers: &[Item] ) -> Result<()> {
	let occurrences: Vec<NodeId> = self.chain( winner ).collect();
	for node in occurrences {
	    if !self.nodes[ node ].alive {
		continue;
	    }
	    let (ancestor, span) = self.find_farthest_ancestor( node, losers )?;
	    let Some( ancestor ) = ancestor else {
		continue;
	    };
	    let anchor = self.nodes[ ancestor ].parent.ok_or( MineError::DetachedNode( ancestor ))?;
	    let parent = self.nodes[ node ].parent.ok_or( MineError::DetachedNode( node ))?;

	    // items from the farthest loser down to the winner's parent
	    let mut segment = Vec::with_capacity( span );
	    let mut current = parent;
	    for _ in 0 .. span {
		let step = &self.nodes[ current ];
		segment.push( step.item.ok_or( MineError::MissingItem( current ))? );
		current = step.parent.ok_or( MineError::DetachedNode( current ))?;
	    }
	    segment.reverse();

	    let tails = self.terminal_paths( node )?;
	    let weight = self.nodes[ node ].count;
	    debug!( "lifting {} transactions of item {} over {:?}", weight, winner, segment );

	    self.retire_subtree( node )?;
	    self.release_span( parent, span, weight )?;
	    for (tail, count) in tails {
		let mut items = segment.clone();
		items.extend( tail );
		items.sort_by_key( |item| self.online_key( *item ));
		self.insert_below( anchor, &items, count )?;
	    }
	}
	Ok( () )
    }

    /// Paths from `start` down to every node at which transactions end, with the number of transactions ending there
    fn terminal_paths( &self, start: NodeId ) -> Result<Vec<(Vec<Item>, Count)>> {
	let mut paths = Vec::new();
	let mut path: Vec<Item> = Vec::new();
	// (node, depth of the node on the path)
	let mut stack: Vec<(NodeId, usize)> = vec!( (start, 0) );
	while let Some( (id, depth) ) = stack.pop() {
	    let node = &self.nodes[ id ];
	    path.truncate( depth );
	    path.push( node.item.ok_or( MineError::MissingItem( id ))? );

	    let below: Count = node.children.iter().map( |child| self.nodes[ *child ].count ).sum();
	    if below > node.count {
		return Err( MineError::CountViolation { node: id, count: node.count, child_count: below } );
	    }
	    if node.count > below {
		paths.push( (path.clone(), node.count - below) );
	    }
	    for child in node.children.iter().rev() {
		stack.push( (*child, depth + 1) );
	    }
	}
	Ok( paths )
    }

    /// Detaches the node from its parent and retires it together with all descendants
    fn retire_subtree( &mut self, node: NodeId ) -> Result<()> {
	self.detach( node )?;
	let mut stack = vec!( node );
	while let Some( id ) = stack.pop() {
	    self.unlink_from_chain( id )?;
	    let children = std::mem::take( &mut self.nodes[ id ].children );
	    for child in &children {
		if let Some( item ) = self.nodes[ *child ].item {
		    self.edges.remove( &(id, item) );
		}
	    }
	    stack.extend( children );
	    self.nodes[ id ].alive = false;
	}
	Ok( () )
    }

    /// Subtracts `weight` from `span` nodes starting at `start` and going up.
    /// Nodes left without transactions are retired.
    fn release_span( &mut self, start: NodeId, span: usize, weight: Count ) -> Result<()> {
	let mut current = start;
	for _ in 0 .. span {
	    let node = &mut self.nodes[ current ];
	    let parent = node.parent.ok_or( MineError::DetachedNode( current ))?;
	    if node.count < weight {
		return Err( MineError::CountViolation { node: current, count: node.count, child_count: weight } );
	    }
	    node.count -= weight;
	    if node.count == 0 {
		if !node.children.is_empty() {
		    return Err( MineError::CountViolation { node: current, count: 0, child_count: weight } );
		}
		self.detach( current )?;
		self.unlink_from_chain( current )?;
		self.nodes[ current ].alive = false;
	    }
	    current = parent;
	}
	Ok( () )
    }

    /// Removes the node from its parent's children
    fn detach( &mut self, node: NodeId ) -> Result<()> {
	let target = &self.nodes[ node ];
	let parent = target.parent.ok_or( MineError::DetachedNode( node ))?;
	let item = target.item.ok_or( MineError::MissingItem( node ))?;
	self.edges.remove( &(parent, item) );
	self.nodes[ parent ].children.retain( |child| *child != node );
	Ok( () )
    }

    /// Takes the node out of its item's chain, fixing head and tail
    fn unlink_from_chain( &mut self, node: NodeId ) -> Result<()> {
	let previous = self.previous_in_chain( node )?;
	let item = self.nodes[ node ].item.ok_or( MineError::MissingItem( node ))?;
	let next = self.nodes[ node ].aux;

	match previous {
	    None => match next {
		Some( next ) => {
		    if let Some( ends ) = self.header.get_mut( &item ) {
			ends.head = next;
		    }
		},
		None => {
		    self.header.remove( &item );
		    self.header_order.retain( |other| *other != item );
		}
	    },
	    Some( previous ) => {
		self.nodes[ previous ].aux = next;
		if let Some( ends ) = self.header.get_mut( &item ) {
		    if ends.tail == node {
			ends.tail = previous;
		    }
		}
	    }
	}
	let target = &mut self.nodes[ node ];
	target.aux = None;
	target.linked = false;
	Ok( () )
    }
}

impl Default for Tree {
    fn default() -> Self {
	Tree::new()
    }
}

impl Loggable for Tree {
    fn log( &self, message: &str, level: Level ) {
	let chains: Vec<String> = self.header_order.iter()
	    .map( |item| format!( "{}:{}x{}", item, self.chain( *item ).count(), self.chain_support( *item )))
	    .collect();
	log_at( level, &format!( "{message}: {} transactions, {} nodes, chains [{}]",
				 self.transaction_count(), self.node_count(), chains.join( " " )));
    }
}

fn check_distinct( items: &[Item] ) -> Result<()> {
    let mut seen: FxHashSet<Item> = FxHashSet::default();
    for item in items {
	if !seen.insert( *item ) {
	    return Err( MineError::DuplicateItem { item: *item } );
	}
    }
    Ok( () )
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::data::ItemIndex;

    const A: Item = 0;
    const B: Item = 1;
    const C: Item = 2;
    const D: Item = 3;

    /// Every root-to-node path must list items in the given order
    fn assert_paths_follow( tree: &Tree, order: &[Item] ) {
	let rank = |item: Item| order.iter().position( |other| *other == item ).expect( "item is ordered" );
	for (id, node) in tree.nodes.iter().enumerate().skip( 1 ) {
	    if !node.alive {
		continue;
	    }
	    let mut path = tree.prefix_path( id ).unwrap();
	    path.push( node.item.unwrap() );
	    let ranks: Vec<usize> = path.iter().map( |item| rank( *item )).collect();
	    assert!( ranks.windows( 2 ).all( |pair| pair[0] < pair[1] ), "path {:?} is out of order", path );
	}
    }

    #[test]
    fn repeated_transaction_shares_one_path() {
	let mut tree = Tree::new();
	for _ in 0 .. 3 {
	    tree.insert_ordered_transaction( &[ A, B, C, D ] ).unwrap();
	}

	assert_eq!( tree.node_count(), 4 );
	let mut current = ROOT;
	for item in [ A, B, C, D ] {
	    let node = tree.node( current ).unwrap();
	    assert_eq!( node.children().len(), 1 );
	    current = node.children()[0];
	    assert_eq!( tree.node( current ).unwrap().item(), Some( item ));
	    assert_eq!( tree.node( current ).unwrap().count(), 3 );
	    assert_eq!( tree.chain( item ).count(), 1 );
	    assert_eq!( tree.head( item ), tree.tail( item ));
	}
	assert!( tree.node( current ).unwrap().children().is_empty() );
    }

    #[test]
    fn duplicate_item_is_rejected() {
	let mut tree = Tree::new();
	let result = tree.insert_ordered_transaction( &[ A, B, A ] );
	assert!( matches!( result, Err( MineError::DuplicateItem { item: A } )));
	assert_eq!( tree.node_count(), 0 );
	assert!( tree.insert_and_order_transaction( &[ C, C ] ).is_err() );
    }

    #[test]
    fn chains_thread_all_occurrences() {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ A, B ] ).unwrap();
	tree.insert_ordered_transaction( &[ B ] ).unwrap();
	tree.insert_ordered_transaction( &[ A, C, B ] ).unwrap();
	tree.insert_ordered_transaction( &[ A, B ] ).unwrap();

	let chain: Vec<NodeId> = tree.chain( B ).collect();
	assert_eq!( chain.len(), 3 );
	assert_eq!( tree.head( B ), Some( chain[0] ));
	assert_eq!( tree.tail( B ), Some( chain[2] ));
	assert_eq!( tree.chain_support( B ), 4 );
	assert_eq!( tree.chain_support( A ), 3 );

	assert_eq!( tree.previous_in_chain( chain[0] ).unwrap(), None );
	assert_eq!( tree.previous_in_chain( chain[2] ).unwrap(), Some( chain[1] ));
	assert!( tree.check_chains().is_ok() );
	assert_eq!( tree.header_items(), &[ A, B, C ] );
    }

    #[test]
    fn relinking_is_an_error() {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ A ] ).unwrap();
	let node = tree.head( A ).unwrap();
	assert!( matches!( tree.link_into_header_table( node ), Err( MineError::AlreadyLinked { .. } )));
	assert!( matches!( tree.link_into_header_table( ROOT ), Err( MineError::MissingItem( ROOT ))));
    }

    #[test]
    fn node_outside_its_chain_is_detected() {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ A, B ] ).unwrap();
	tree.insert_ordered_transaction( &[ B ] ).unwrap();
	let head = tree.head( B ).unwrap();
	let tail = tree.tail( B ).unwrap();
	// cut the chain behind the head
	tree.nodes[ head ].aux = None;

	assert!( matches!( tree.previous_in_chain( tail ), Err( MineError::BrokenChain { .. } )));
	assert!( tree.check_chains().is_err() );
    }

    #[test]
    fn farthest_ancestor_on_path() {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ A, B, C, D ] ).unwrap();
	let leaf = tree.head( D ).unwrap();

	let (ancestor, distance) = tree.find_farthest_ancestor( leaf, &[ B, C ] ).unwrap();
	assert_eq!( ancestor, tree.head( B ));
	assert_eq!( distance, 2 );

	let (ancestor, distance) = tree.find_farthest_ancestor( leaf, &[ A, C ] ).unwrap();
	assert_eq!( ancestor, tree.head( A ));
	assert_eq!( distance, 3 );

	// no match is not an error
	assert_eq!( tree.find_farthest_ancestor( leaf, &[ 9 ] ).unwrap(), (None, 0) );
	assert_eq!( tree.find_farthest_ancestor( ROOT, &[ A ] ).unwrap(), (None, 0) );
    }

    #[test]
    fn farthest_ancestor_checks_counts() {
	let mut tree = Tree::new();
	tree.insert_ordered_transaction( &[ A, B ] ).unwrap();
	let leaf = tree.head( B ).unwrap();
	tree.nodes[ leaf ].count = 5;
	assert!( matches!( tree.find_farthest_ancestor( leaf, &[ A ] ), Err( MineError::CountViolation { .. } )));
    }

    #[test]
    fn groups_hand_back_remainder() {
	let mut tree = Tree::new();
	tree.insert_and_order_transaction( &[ A, B, C ] ).unwrap();
	// all three reached support 1, in this order
	assert_eq!( tree.remove_from_group( 1, B ), vec!( A, C ));
	assert!( tree.remove_from_group( 7, B ).is_empty() );
    }

    #[test]
    fn overtaking_item_moves_up() {
	let mut tree = Tree::new();
	tree.insert_and_order_transaction( &[ B ] ).unwrap();
	tree.insert_and_order_transaction( &[ A, B ] ).unwrap();
	tree.insert_and_order_transaction( &[ A ] ).unwrap();
	// A had support 2 after B, now it overtakes B
	tree.insert_and_order_transaction( &[ A ] ).unwrap();

	assert_eq!( tree.online_order(), vec!( A, B ));
	assert_eq!( tree.transaction_count(), 4 );
	assert_eq!( tree.chain_support( A ), 3 );
	assert_eq!( tree.chain_support( B ), 2 );
	assert_eq!( tree.node_count(), 3 );
	assert!( tree.check_chains().is_ok() );
	assert_paths_follow( &tree, &tree.online_order() );
    }

    #[test]
    fn self_ordering_keeps_supports_exact() {
	let data: Vec<Vec<Item>> = vec!(
	    vec!( 4, 3 ),
	    vec!( 3, 2, 4 ),
	    vec!( 0, 1 ),
	    vec!( 1, 0, 2 ),
	    vec!( 2, 1 ),
	    vec!( 0 ),
	    vec!( 2, 0, 3, 1 ),
	    vec!( 1 ),
	    vec!( 4, 0 ),
	    vec!( 0, 2 ),
	);
	let mut tree = Tree::new();
	for transaction in &data {
	    tree.insert_and_order_transaction( transaction ).unwrap();
	    assert!( tree.check_chains().is_ok() );
	    assert_paths_follow( &tree, &tree.online_order() );
	}

	let index = ItemIndex::new( &data );
	for item in 0 .. 5 {
	    assert_eq!( tree.chain_support( item ), index.support( &[ item ] ), "item {}", item );
	}
	assert_eq!( tree.transaction_count(), data.len() as Count );
    }
}
