
use std::collections::BTreeMap;

use bit_set::BitSet;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{Item, Count, Transaction};
use crate::data::FList;
use crate::error::{MineError, Result};

/// Handle of a hyperlink inside a table's arena
pub type LinkId = usize;

/// Canonically ordered transactions that all hyperlink tables point into.
/// The rows are never copied or changed while mining.
#[derive( Debug, Clone, Default )]
pub struct Hdb {
    rows: Vec<Transaction>,
}

/// Points at one item occurrence: the row and the position of the item in that row
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct Hyperlink {
    pub row: usize,
    pub position: usize,
    next: Option<LinkId>,
}

#[derive( Debug, Clone )]
struct Header {
    item: Item,
    head: Option<LinkId>,
    tail: Option<LinkId>,
    support: Count,
}

/// Header table of one projection of the database.
///
/// Each header owns a chain of hyperlinks to the rows that contain its item. Conditional tables
/// for a prefix item are derived from that item's chain and kept under the item until they are taken.
#[derive( Debug, Clone )]
pub struct HTable<'db> {
    hdb: &'db Hdb,
    /// canonical order once the table is complete
    headers: Vec<Header>,
    index: FxHashMap<Item, usize>,
    links: Vec<Hyperlink>,
    /// rows already threaded into this table
    covered: BitSet,
    conditional: BTreeMap<Item, HTable<'db>>,
}

impl Hdb {

    /// Stores one row per transaction, keeping the first occurrence of repeated items.
    /// Rows must already follow the canonical order.
    pub fn build( transactions: &[Transaction] ) -> Hdb {
	let rows = transactions.iter()
	    .map( |transaction| {
		let mut row = Transaction::with_capacity( transaction.len() );
		for item in transaction {
		    if !row.contains( item ) {
			row.push( *item );
		    }
		}
		row
	    }).collect();
	Hdb { rows }
    }

    /// Reorders the raw transactions by the f-list and stores them
    pub fn from_flist( flist: &FList, transactions: &[Transaction] ) -> Hdb {
	Hdb { rows: flist.reorder_all( transactions ) }
    }

    pub fn row( &self, row: usize ) -> Option<&[Item]> {
	self.rows.get( row ).map( |r| r.as_slice() )
    }

    pub fn rows( &self ) -> &[Transaction] { &self.rows }

    pub fn len( &self ) -> usize { self.rows.len() }

    pub fn is_empty( &self ) -> bool { self.rows.is_empty() }
}

impl <'db> HTable<'db> {

    fn empty( hdb: &'db Hdb ) -> HTable<'db> {
	HTable {
	    hdb,
	    headers: Vec::new(),
	    index: FxHashMap::default(),
	    links: Vec::new(),
	    covered: BitSet::with_capacity( hdb.len() ),
	    conditional: BTreeMap::new(),
	}
    }

    /// Creates one header per frequent item of the f-list and links every occurrence of it in the database.
    /// Fails if a row lists frequent items out of canonical order.
    pub fn init( hdb: &'db Hdb, min_support: Count, flist: &FList ) -> Result<HTable<'db>> {
	let mut table = HTable::empty( hdb );
	for item in flist.items() {
	    if flist.support( *item ).unwrap_or( 0 ) >= min_support {
		table.header_for( *item );
	    }
	}

	for (row, transaction) in hdb.rows.iter().enumerate() {
	    let mut last_rank = None;
	    for (position, item) in transaction.iter().enumerate() {
		let Some( rank ) = flist.rank( *item ) else {
		    continue;
		};
		if last_rank.map_or( false, |last| last >= rank ) {
		    return Err( MineError::UnorderedRow { row } );
		}
		last_rank = Some( rank );
		if let Some( header ) = table.index.get( item ).copied() {
		    table.append( header, row, position );
		}
	    }
	    table.covered.insert( row );
	}
	Ok( table )
    }

    /// Number of headers
    pub fn len( &self ) -> usize { self.headers.len() }

    pub fn is_empty( &self ) -> bool { self.headers.is_empty() }

    /// Items with a header, in canonical order
    pub fn items( &self ) -> impl Iterator<Item = Item> + '_ {
	self.headers.iter().map( |header| header.item )
    }

    /// Support recorded in the item's header
    pub fn support( &self, item: Item ) -> Option<Count> {
	self.index.get( &item ).map( |header| self.headers[ *header ].support )
    }

    /// Hyperlinks of the item, in the order they were added
    pub fn chain( &self, item: Item ) -> Result<impl Iterator<Item = &Hyperlink> + '_> {
	let header = self.index.get( &item ).ok_or( MineError::UnknownItem( item ))?;
	let head = self.headers[ *header ].head;
	Ok( std::iter::successors( head.map( |id| &self.links[ id ] ), move |link| link.next.map( |id| &self.links[ id ] )))
    }

    /// Counts the links on the item's chain
    pub fn chain_support( &self, item: Item ) -> Result<Count> {
	Ok( self.chain( item )?.count() as Count )
    }

    /// First header at or after `cursor` whose support reaches `min_support`
    pub fn next_frequent( &self, cursor: usize, min_support: Count ) -> Option<(usize, Item, Count)> {
	self.headers.iter().enumerate().skip( cursor )
	    .find( |(_, header)| header.support >= min_support && header.support > 0 )
	    .map( |(position, header)| (position, header.item, header.support) )
    }

    /// Builds or extends the conditional table of `prefix`.
    ///
    /// Every row on the prefix's chain that is not yet part of the conditional table contributes
    /// the frequent items after the prefix. Rows already linked are skipped, so deriving twice changes nothing.
    pub fn derive_conditional_links( &mut self, prefix: Item, flist: &FList, min_support: Count ) -> Result<()> {
	let occurrences: Vec<(usize, usize)> = self.chain( prefix )?
	    .map( |link| (link.row, link.position) )
	    .collect();

	let hdb = self.hdb;
	let child = self.conditional.entry( prefix ).or_insert_with( || HTable::empty( hdb ));
	let mut added = 0;
	for (row, position) in occurrences {
	    if !child.covered.insert( row ) {
		continue;
	    }
	    for (offset, item) in hdb.rows[ row ].iter().enumerate().skip( position + 1 ) {
		if !flist.is_frequent( *item ) || flist.support( *item ).unwrap_or( 0 ) < min_support {
		    continue;
		}
		let header = child.header_for( *item );
		child.append( header, row, offset );
		added += 1;
	    }
	}
	if added > 0 {
	    child.sort_headers( flist );
	}
	trace!( "conditional table of {} gained {} links", prefix, added );
	Ok( () )
    }

    pub fn conditional( &self, prefix: Item ) -> Option<&HTable<'db>> {
	self.conditional.get( &prefix )
    }

    /// Hands the conditional table of `prefix` over to the caller
    pub fn take_conditional( &mut self, prefix: Item ) -> Option<HTable<'db>> {
	self.conditional.remove( &prefix )
    }

    fn header_for( &mut self, item: Item ) -> usize {
	if let Some( header ) = self.index.get( &item ) {
	    return *header;
	}
	let header = self.headers.len();
	self.headers.push( Header { item, head: None, tail: None, support: 0 } );
	self.index.insert( item, header );
	header
    }

    fn append( &mut self, header: usize, row: usize, position: usize ) {
	let id = self.links.len();
	self.links.push( Hyperlink { row, position, next: None } );
	let entry = &mut self.headers[ header ];
	match entry.tail {
	    Some( tail ) => self.links[ tail ].next = Some( id ),
	    None => entry.head = Some( id ),
	}
	entry.tail = Some( id );
	entry.support += 1;
    }

    fn sort_headers( &mut self, flist: &FList ) {
	self.headers.sort_by_key( |header| flist.rank( header.item ).unwrap_or( usize::MAX ));
	self.index = self.headers.iter().enumerate()
	    .map( |(position, header)| (header.item, position) )
	    .collect();
    }
}
