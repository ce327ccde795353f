
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::{Item, Count, Transaction};

/// Support of every item in a batch plus the canonical order of the frequent ones.
///
/// The canonical order sorts by descending support. Ties are broken by the order in which items were first seen in the batch,
/// so two runs over the same batch always agree.
#[derive( Debug, Clone, Default )]
pub struct FList {
    /// raw counts, including items below the threshold
    counts: FxHashMap<Item, Count>,
    /// frequent items in canonical order
    order: Vec<Item>,
    /// position of each frequent item in `order`
    rank: FxHashMap<Item, usize>,
    min_support: Count,
}

impl FList {

    /// Counts every item once per transaction and orders those reaching `min_support`.
    /// An empty batch yields an empty table.
    pub fn build( transactions: &[Transaction], min_support: Count ) -> FList {
	let (counts, first_seen) = count_items( transactions );

	let candidates: Vec<(Item, Count)> = first_seen.iter()
	    .map( |item| (*item, counts[ item ]) )
	    .filter( |(_, count)| *count >= min_support )
	    .collect();
	let order = priority_sort( &candidates, false );
	let rank = order.iter().enumerate().map( |(position, item)| (*item, position) ).collect();

	debug!( "f-list keeps {} of {} items at support {}", order.len(), counts.len(), min_support );
	FList { counts, order, rank, min_support }
    }

    /// Raw support of the item, also for items below the threshold
    pub fn support( &self, item: Item ) -> Option<Count> {
	self.counts.get( &item ).copied()
    }

    pub fn is_frequent( &self, item: Item ) -> bool {
	self.rank.contains_key( &item )
    }

    /// Position of a frequent item in the canonical order
    pub fn rank( &self, item: Item ) -> Option<usize> {
	self.rank.get( &item ).copied()
    }

    /// Frequent items in canonical order
    pub fn items( &self ) -> &[Item] { &self.order }

    pub fn min_support( &self ) -> Count { self.min_support }

    /// Number of frequent items
    pub fn len( &self ) -> usize { self.order.len() }

    pub fn is_empty( &self ) -> bool { self.order.is_empty() }

    /// Drops infrequent and repeated items and sorts the rest canonically
    pub fn reorder( &self, transaction: &[Item] ) -> Transaction {
	let mut ranked: Vec<usize> = transaction.iter()
	    .filter_map( |item| self.rank( *item ))
	    .collect();
	ranked.sort_unstable();
	ranked.dedup();
	ranked.into_iter().map( |position| self.order[ position ] ).collect()
    }

    /// Reorders every transaction. Emits one row per input, rows may be empty.
    pub fn reorder_all( &self, transactions: &[Transaction] ) -> Vec<Transaction> {
	transactions.iter().map( |t| self.reorder( t )).collect()
    }
}

/// Builds the f-list of the batch and reorders all transactions by it
pub fn reorder_transactions( transactions: &[Transaction], min_support: Count ) -> Vec<Transaction> {
    FList::build( transactions, min_support ).reorder_all( transactions )
}

/// Stable sort of items by their count, descending unless `ascending` is set.
/// Items with equal counts keep their input order.
pub fn priority_sort( counts: &[(Item, Count)], ascending: bool ) -> Vec<Item> {
    let mut sorted: Vec<(Item, Count)> = counts.to_vec();
    if ascending {
	sorted.sort_by( |left, right| left.1.cmp( &right.1 ));
    } else {
	sorted.sort_by( |left, right| left.1.cmp( &right.1 ).reverse() );
    }
    sorted.into_iter().map( |(item, _)| item ).collect()
}

/// Converts a relative threshold into a transaction count, rounding down
pub fn compute_support( fraction: f64, number_transactions: usize ) -> Count {
    let support = ( fraction * number_transactions as f64 ).floor() as Count;
    debug!( "{} transactions at fraction {} give support {}", number_transactions, fraction, support );
    support
}

/// Counts items once per transaction and records the order in which they were first seen
fn count_items( transactions: &[Transaction] ) -> (FxHashMap<Item, Count>, Vec<Item>) {
    let mut counts: FxHashMap<Item, Count> = FxHashMap::default();
    let mut first_seen: Vec<Item> = Vec::new();
    let mut in_transaction: FxHashSet<Item> = FxHashSet::default();
    for transaction in transactions {
	in_transaction.clear();
	for item in transaction {
	    if !in_transaction.insert( *item ) {
		continue;
	    }
	    match counts.get_mut( item ) {
		Some( count ) => *count += 1,
		None => {
		    counts.insert( *item, 1 );
		    first_seen.push( *item );
		}
	    }
	}
    }
    (counts, first_seen)
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn empty_batch_gives_empty_table() {
	let flist = FList::build( &[], 3 );
	assert!( flist.is_empty() );
	assert_eq!( flist.support( 0 ), None );
    }

    #[test]
    fn keeps_raw_counts_below_threshold() {
	let data = vec!( vec!( 0, 1 ), vec!( 1 ), vec!( 1, 2 ));
	let flist = FList::build( &data, 2 );

	assert_eq!( flist.items(), &[ 1 ] );
	assert_eq!( flist.support( 0 ), Some( 1 ));
	assert!( !flist.is_frequent( 0 ));
	assert_eq!( flist.rank( 1 ), Some( 0 ));
    }

    #[test]
    fn ties_follow_first_sight() {
	// 3 and 1 both occur twice, 3 is seen first
	let data = vec!( vec!( 3, 2 ), vec!( 1, 3 ), vec!( 1, 4, 4 ));
	let flist = FList::build( &data, 1 );

	assert_eq!( flist.items(), &[ 3, 1, 2, 4 ] );
	// duplicates inside a transaction count once
	assert_eq!( flist.support( 4 ), Some( 1 ));
    }

    #[test]
    fn reorder_filters_and_sorts() {
	let data = vec!(
	    vec!( 5, 0, 1 ),
	    vec!( 1, 0 ),
	    vec!( 1, 7 ),
	);
	let reordered = reorder_transactions( &data, 2 );
	assert_eq!( reordered, vec!( vec!( 1, 0 ), vec!( 1, 0 ), vec!( 1 )));

	let flist = FList::build( &data, 2 );
	assert_eq!( flist.reorder( &[ 0, 0, 1, 9 ] ), vec!( 1, 0 ));
	// rows are kept even if nothing survives
	assert_eq!( flist.reorder_all( &[ vec!( 7 ) ] ), vec!( Vec::<Item>::new() ));
    }

    #[test]
    fn zero_support_keeps_everything() {
	let data = vec!( vec!( 2 ), vec!( 0, 1 ));
	assert_eq!( FList::build( &data, 0 ).len(), 3 );
    }

    #[test]
    fn priority_sort_is_stable() {
	let counts = vec!( (10, 2), (11, 5), (12, 2), (13, 1) );
	assert_eq!( priority_sort( &counts, false ), vec!( 11, 10, 12, 13 ));
	assert_eq!( priority_sort( &counts, true ), vec!( 13, 10, 12, 11 ));
    }

    #[test]
    fn support_from_fraction() {
	assert_eq!( compute_support( 0.25, 10 ), 2 );
	assert_eq!( compute_support( 0.0, 10 ), 0 );
	assert_eq!( compute_support( 1.0, 7 ), 7 );
    }
}
