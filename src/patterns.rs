
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, Level};

use crate::{Item, Count, Loggable, log_at};
use crate::data::Encoder;
use crate::error::{MineError, Result};
use crate::io::{PrettyFormatter, produce_fimi};

#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct FrequentItemset<I = Item> {
    pub items: Vec<I>,
    pub support: Count,
}

/// Mined itemsets grouped by length.
/// Within a group, itemsets stay in the order they were inserted until `truncate` sorts them by support.
#[derive( Debug, Clone )]
pub struct PatternSet<I = Item> {
    buckets: BTreeMap<usize, Vec<FrequentItemset<I>>>,
    /// sorted items -> support
    lookup: FxHashMap<Vec<I>, Count>,
}

impl <I: Ord + Hash + Clone + Debug> PatternSet<I> {

    pub fn new() -> PatternSet<I> {
	PatternSet { buckets: BTreeMap::new(), lookup: FxHashMap::default() }
    }

    /// Records an itemset. Inserting the same set again only updates its support.
    pub fn insert( &mut self, items: Vec<I>, support: Count ) {
	let key = sorted( &items );
	if let Some( known ) = self.lookup.get_mut( &key ) {
	    *known = support;
	    if let Some( bucket ) = self.buckets.get_mut( &items.len() ) {
		if let Some( pattern ) = bucket.iter_mut().find( |p| sorted( &p.items ) == key ) {
		    pattern.support = support;
		}
	    }
	    return;
	}
	self.lookup.insert( key, support );
	self.buckets.entry( items.len() ).or_default().push( FrequentItemset { items, support } );
    }

    /// Support of the itemset in any item order
    pub fn support( &self, items: &[I] ) -> Result<Count> {
	self.lookup.get( &sorted( items )).copied()
	    .ok_or_else( || MineError::NotFound( format!( "{:?}", items )))
    }

    pub fn contains( &self, items: &[I] ) -> bool {
	self.lookup.contains_key( &sorted( items ))
    }

    /// Itemsets of the given length
    pub fn bucket( &self, length: usize ) -> &[FrequentItemset<I>] {
	self.buckets.get( &length ).map_or( &[], |bucket| bucket.as_slice() )
    }

    /// Lengths that have at least one itemset, ascending
    pub fn lengths( &self ) -> impl Iterator<Item = usize> + '_ {
	self.buckets.keys().copied()
    }

    /// All itemsets, shorter ones first
    pub fn iter( &self ) -> impl Iterator<Item = &FrequentItemset<I>> + '_ {
	self.buckets.values().flatten()
    }

    pub fn len( &self ) -> usize { self.lookup.len() }

    pub fn is_empty( &self ) -> bool { self.lookup.is_empty() }

    /// Keeps itemsets no longer than `max_length` and, per length, the `top_k[ length - 1 ]` with the highest support.
    /// Lengths beyond the end of `top_k` are not cut. Equal supports keep their previous order.
    pub fn truncate( self, max_length: Option<usize>, top_k: &[usize] ) -> PatternSet<I> {
	let mut kept = PatternSet::new();
	for (length, mut bucket) in self.buckets {
	    if max_length.map_or( false, |max| length > max ) {
		continue;
	    }
	    bucket.sort_by( |left, right| right.support.cmp( &left.support ));
	    if let Some( k ) = length.checked_sub( 1 ).and_then( |slot| top_k.get( slot )) {
		bucket.truncate( *k );
	    }
	    for pattern in bucket {
		kept.insert( pattern.items, pattern.support );
	    }
	}
	kept
    }
}

impl <I: Ord + Hash + Clone + Debug> Default for PatternSet<I> {
    fn default() -> Self {
	PatternSet::new()
    }
}

impl <I: Ord + Hash + Clone + Debug> FromIterator<FrequentItemset<I>> for PatternSet<I> {
    fn from_iter<T: IntoIterator<Item = FrequentItemset<I>>>( iter: T ) -> Self {
	let mut patterns = PatternSet::new();
	for pattern in iter {
	    patterns.insert( pattern.items, pattern.support );
	}
	patterns
    }
}

impl <I: Ord + Hash + Clone + Debug> PartialEq for PatternSet<I> {
    /// Two sets are equal if they hold the same itemsets with the same supports, regardless of order
    fn eq( &self, other: &Self ) -> bool {
	self.lookup == other.lookup
    }
}

impl <I: Ord + Hash + Clone + Debug> Loggable for PatternSet<I> {
    fn log( &self, message: &str, level: Level ) {
	let sizes: Vec<String> = self.buckets.iter()
	    .map( |(length, bucket)| format!( "{}:{}", length, bucket.len() ))
	    .collect();
	log_at( level, &format!( "{message}: {} itemsets by length [{}]", self.len(), sizes.join( " " )));
    }
}

/// Turns raw mining output into labelled itemsets, keeping only lengths up to `max_length`
/// and the top itemsets by support per length.
/// A zero in `top_k` empties that length, lengths past its end are kept whole.
pub fn decode_results( encoder: &Encoder, raw: &PatternSet<Item>, max_length: Option<usize>, top_k: &[usize] ) -> Result<PatternSet<String>> {
    let mut decoded = PatternSet::new();
    for length in raw.lengths() {
	if max_length.map_or( false, |max| length > max ) {
	    continue;
	}
	for pattern in raw.bucket( length ) {
	    if pattern.support == 0 {
		continue;
	    }
	    decoded.insert( encoder.decode_items( &pattern.items )?, pattern.support );
	}
    }
    let before = decoded.len();
    let decoded = decoded.truncate( max_length, top_k );
    debug!( "decoded {} itemsets, kept {}", before, decoded.len() );
    Ok( decoded )
}

/// Writes itemsets one per line as `support: items`
pub struct PatternFormatter {
    show_lengths: bool,
}

impl PatternFormatter {
    pub fn new() -> PatternFormatter {
	PatternFormatter { show_lengths: false }
    }

    pub fn show_lengths( &mut self ) { self.show_lengths = true; }
}

impl Default for PatternFormatter {
    fn default() -> Self {
	PatternFormatter::new()
    }
}

impl <I: Ord + Hash + Clone + Debug + Display> PrettyFormatter<PatternSet<I>> for PatternFormatter {

    fn format_pretty( &self, patterns: &PatternSet<I> ) -> String {
	let mut output = String::new();
	for length in patterns.lengths() {
	    if self.show_lengths {
		output.push_str( &format!( "# length {length}\n" ));
	    }
	    for pattern in patterns.bucket( length ) {
		output.push_str( &format!( "{}: {}\n", pattern.support, produce_fimi( pattern.items.iter(), "", " ", "" ).trim_end() ));
	    }
	}
	output
    }
}

fn sorted<I: Ord + Clone>( items: &[I] ) -> Vec<I> {
    let mut key = items.to_vec();
    key.sort();
    key
}

#[cfg(test)]
mod test {

    use super::*;

    fn labels( items: &[&str] ) -> Vec<String> {
	items.iter().map( |l| l.to_string() ).collect()
    }

    #[test]
    fn lookup_ignores_item_order() {
	let mut patterns: PatternSet<Item> = PatternSet::new();
	patterns.insert( vec!( 2, 0 ), 3 );
	patterns.insert( vec!( 1 ), 5 );

	assert_eq!( patterns.support( &[ 0, 2 ] ).unwrap(), 3 );
	assert_eq!( patterns.len(), 2 );
	assert_eq!( patterns.bucket( 2 ).len(), 1 );
	assert!( matches!( patterns.support( &[ 0, 1 ] ), Err( MineError::NotFound( _ ))));
    }

    #[test]
    fn reinsert_updates_support() {
	let mut patterns: PatternSet<Item> = PatternSet::new();
	patterns.insert( vec!( 1, 4 ), 2 );
	patterns.insert( vec!( 4, 1 ), 6 );
	assert_eq!( patterns.len(), 1 );
	assert_eq!( patterns.bucket( 2 )[0].support, 6 );
    }

    #[test]
    fn decode_cuts_per_length() {
	let encoder = Encoder::from_labels( labels( &[ "a", "b", "c", "d" ] ));
	let mut raw: PatternSet<Item> = PatternSet::new();
	raw.insert( vec!( 0 ), 5 );
	raw.insert( vec!( 1 ), 7 );
	raw.insert( vec!( 2 ), 6 );
	raw.insert( vec!( 0, 1 ), 2 );
	raw.insert( vec!( 1, 2 ), 4 );
	raw.insert( vec!( 0, 1, 2 ), 1 );
	raw.insert( vec!( 0, 1, 2, 3 ), 1 );

	let decoded = decode_results( &encoder, &raw, Some( 3 ), &[ 2, 1 ] ).unwrap();
	let singles: Vec<&FrequentItemset<String>> = decoded.bucket( 1 ).iter().collect();
	assert_eq!( singles.len(), 2 );
	assert_eq!( singles[0].items, labels( &[ "b" ] ));
	assert_eq!( singles[1].items, labels( &[ "c" ] ));
	assert_eq!( decoded.bucket( 2 ).len(), 1 );
	assert_eq!( decoded.support( &labels( &[ "c", "b" ] )).unwrap(), 4 );
	// past the end of top_k nothing is cut, past max_length everything is
	assert_eq!( decoded.bucket( 3 ).len(), 1 );
	assert!( decoded.bucket( 4 ).is_empty() );
    }

    #[test]
    fn zero_quota_empties_length() {
	let encoder = Encoder::from_labels( labels( &[ "a", "b" ] ));
	let mut raw: PatternSet<Item> = PatternSet::new();
	raw.insert( vec!( 0 ), 2 );
	raw.insert( vec!( 0, 1 ), 1 );
	let decoded = decode_results( &encoder, &raw, None, &[ 0 ] ).unwrap();
	assert!( decoded.bucket( 1 ).is_empty() );
	assert_eq!( decoded.len(), 1 );
    }

    #[test]
    fn unknown_code_fails_decoding() {
	let encoder = Encoder::from_labels( labels( &[ "a" ] ));
	let mut raw: PatternSet<Item> = PatternSet::new();
	raw.insert( vec!( 3 ), 2 );
	assert!( decode_results( &encoder, &raw, None, &[] ).is_err() );
    }

    #[test]
    fn formatter_lists_support_first() {
	let mut patterns: PatternSet<String> = PatternSet::new();
	patterns.insert( labels( &[ "x", "y" ] ), 3 );
	let mut formatter = PatternFormatter::new();
	assert_eq!( formatter.format_pretty( &patterns ), "3: x y\n" );
	formatter.show_lengths();
	assert_eq!( formatter.format_pretty( &patterns ), "# length 2\n3: x y\n" );
    }
}
