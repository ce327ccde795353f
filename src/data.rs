
use bit_set::BitSet;

pub mod encoder;
pub mod flist;
pub mod value_map;

pub use encoder::{Encoder, encode_transactions};
pub use flist::{FList, priority_sort, reorder_transactions, compute_support};
pub use value_map::ValueMap;

/// Dense integer code of an item label.
pub type Item = usize;
pub type Count = u64;
/// Items of one user or session. Items are distinct once a transaction passed the reorderer.
pub type Transaction = Vec<Item>;
/// Raw transaction as delivered by the caller.
pub type LabelTransaction = Vec<String>;

/// Vertical index that stores the set of transactions containing each item.
/// Answers support queries for arbitrary itemsets by intersecting the sets,
/// which makes it the reference every miner is checked against.
pub struct ItemIndex {
    /// item -> transactions containing it
    columns: Vec<BitSet>,
    number_transactions: usize,
}

impl ItemIndex {

    pub fn new <'a, D> ( transactions: D ) -> ItemIndex where D: IntoIterator<Item = &'a Transaction> {
	let mut columns: Vec<BitSet> = Vec::new();
	let mut number_transactions = 0;
	for (tid, transaction) in transactions.into_iter().enumerate() {
	    for item in transaction {
		if *item >= columns.len() {
		    columns.resize( *item + 1, BitSet::new() );
		}
		columns[ *item ].insert( tid );
	    }
	    number_transactions = tid + 1;
	}
	ItemIndex { columns, number_transactions }
    }

    pub fn number_transactions( &self ) -> usize { self.number_transactions }

    /// Number of transactions that contain every item of the query.
    /// The empty query is contained in every transaction.
    pub fn support( &self, query: &[Item] ) -> Count {
	let Some( (first, rest) ) = query.split_first() else {
	    return self.number_transactions as Count;
	};
	let Some( column ) = self.columns.get( *first ) else {
	    return 0;
	};
	let mut selection = column.clone();
	for item in rest {
	    match self.columns.get( *item ) {
		Some( column ) => selection.intersect_with( column ),
		None => return 0,
	    }
	    if selection.is_empty() {
		return 0;
	    }
	}
	selection.len() as Count
    }
}
