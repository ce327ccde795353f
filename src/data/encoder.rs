
use rustc_hash::FxHashMap;

use crate::error::{MineError, Result};
use super::{Item, Transaction, LabelTransaction};

/// Bidirectional table between item labels and dense integer codes.
/// Codes are handed out in the order labels are first seen, so encoding the same batch twice yields the same codes.
#[derive( Debug, Clone, Default )]
pub struct Encoder {
    codes: FxHashMap<String, Item>,
    labels: Vec<String>,
}

impl Encoder {

    pub fn new() -> Encoder {
	Encoder::default()
    }

    /// Restores an encoder from its labels, listed by code
    pub fn from_labels( labels: Vec<String> ) -> Encoder {
	let codes = labels.iter().enumerate()
	    .map( |(code, label)| (label.clone(), code) )
	    .collect();
	Encoder { codes, labels }
    }

    /// Returns the code of the label, assigning the next free code to unseen labels
    pub fn encode( &mut self, label: &str ) -> Item {
	if let Some( code ) = self.codes.get( label ) {
	    return *code;
	}
	let code = self.labels.len();
	self.labels.push( label.to_string() );
	self.codes.insert( label.to_string(), code );
	code
    }

    pub fn code( &self, label: &str ) -> Option<Item> {
	self.codes.get( label ).copied()
    }

    pub fn label( &self, code: Item ) -> Option<&str> {
	self.labels.get( code ).map( |label| label.as_str() )
    }

    pub fn decode( &self, code: Item ) -> Result<&str> {
	self.label( code ).ok_or( MineError::UnknownCode( code ))
    }

    pub fn decode_items( &self, items: &[Item] ) -> Result<Vec<String>> {
	items.iter()
	    .map( |code| self.decode( *code ).map( |label| label.to_string() ))
	    .collect()
    }

    /// Labels ordered by their code
    pub fn labels( &self ) -> &[String] { &self.labels }

    pub fn len( &self ) -> usize { self.labels.len() }

    pub fn is_empty( &self ) -> bool { self.labels.is_empty() }
}

/// Replaces every label by its code. Repeated labels inside one transaction are kept once.
pub fn encode_transactions( transactions: &[LabelTransaction] ) -> (Vec<Transaction>, Encoder) {
    let mut encoder = Encoder::new();
    let encoded = transactions.iter()
	.map( |transaction| {
	    let mut items: Transaction = Vec::with_capacity( transaction.len() );
	    for label in transaction {
		let code = encoder.encode( label );
		if !items.contains( &code ) {
		    items.push( code );
		}
	    }
	    items
	}).collect();
    (encoded, encoder)
}

#[cfg(test)]
mod test {

    use super::*;

    fn labels( rows: &[&[&str]] ) -> Vec<LabelTransaction> {
	rows.iter().map( |row| row.iter().map( |l| l.to_string() ).collect() ).collect()
    }

    #[test]
    fn codes_follow_first_sight() {
	let data = labels( &[ &[ "b", "a" ], &[ "c", "b", "b" ] ] );
	let (encoded, encoder) = encode_transactions( &data );

	assert_eq!( encoded, vec!( vec!( 0, 1 ), vec!( 2, 0 )));
	assert_eq!( encoder.code( "c" ), Some( 2 ));
	assert_eq!( encoder.decode_items( &[ 1, 2 ] ).unwrap(), vec!( "a", "c" ));
    }

    #[test]
    fn unknown_code_is_an_error() {
	let encoder = Encoder::from_labels( vec!( "x".to_string() ));
	assert_eq!( encoder.decode( 0 ).unwrap(), "x" );
	assert!( matches!( encoder.decode( 1 ), Err( MineError::UnknownCode( 1 ))));
    }
}
