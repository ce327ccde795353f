use std::fmt::Display;
use std::path::Path;
use std::fs::File;
use std::io::{BufReader, BufRead, BufWriter, Write};

use serde_json as json;
use tracing::{debug, warn};

use crate::LabelTransaction;
use crate::error::{MineError, Result};
use crate::patterns::{FrequentItemset, PatternSet};

/// Converts a structure into a string
pub trait PrettyFormatter<T> {
    fn format_pretty( &self, object: &T ) -> String;
}

pub type DataGenerator<T> = Box<dyn Iterator<Item = Result<T>>>;

/// Layout of a transaction file
#[derive( Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum )]
pub enum InputFormat {
    /// one JSON array of labels per line
    Json,
    /// labels separated by whitespace, one transaction per line
    Plain,
}

/// Reads a file line by line. Lines the converter rejects are dropped, lines that cannot be read are errors.
pub fn read_data<T, F, P>( path: P, converter: F ) -> Result<DataGenerator<T>> where
    F: Fn(&str) -> Option<T> + 'static,
    P: AsRef<Path>,
{
    let file = File::open( path.as_ref() )?;
    let reader = BufReader::new( file );
    let generator = reader.lines()
        .filter_map( move |l| match l {
	    Ok( l ) => converter( &l ).map( Ok ),
	    Err( err ) => Some( Err( MineError::Io( err ))),
	});
    Result::Ok( Box::new( generator ))
}

/// Splits a line into labels. Blank lines carry no transaction.
pub fn parse_plain( line: &str ) -> Option<LabelTransaction> {
    let labels: LabelTransaction = line.split_whitespace().map( |label| label.to_string() ).collect();
    if labels.is_empty() {
	None
    } else {
	Some( labels )
    }
}

/// Reads a transaction file. JSON lines that do not hold an array of strings are an error, blank lines are skipped.
pub fn read_transactions<P: AsRef<Path>>( path: P, format: InputFormat ) -> Result<Vec<LabelTransaction>> {
    let transactions: Vec<LabelTransaction> = match format {
	InputFormat::Plain => read_data( path.as_ref(), parse_plain )?.collect::<Result<_>>()?,
	InputFormat::Json => {
	    let reader = BufReader::new( File::open( path.as_ref() )? );
	    let mut transactions = Vec::new();
	    for line in reader.lines() {
		let line = line?;
		if line.trim().is_empty() {
		    continue;
		}
		transactions.push( json::from_str( &line )? );
	    }
	    transactions
	}
    };
    debug!( "read {} transactions from {}", transactions.len(), path.as_ref().display() );
    Ok( transactions )
}

/// Writes one JSON array per transaction
pub fn write_transactions<P: AsRef<Path>>( path: P, transactions: &[LabelTransaction] ) -> Result<()> {
    let mut writer = BufWriter::new( File::create( path.as_ref() )? );
    for transaction in transactions {
	json::to_writer( &mut writer, transaction )?;
	writeln!( writer )?;
    }
    writer.flush()?;
    Ok( () )
}

/// Writes one JSON itemset per line, shorter itemsets first
pub fn write_patterns<P: AsRef<Path>>( path: P, patterns: &PatternSet<String> ) -> Result<()> {
    let mut writer = BufWriter::new( File::create( path.as_ref() )? );
    for pattern in patterns.iter() {
	json::to_writer( &mut writer, pattern )?;
	writeln!( writer )?;
    }
    writer.flush()?;
    debug!( "wrote {} itemsets to {}", patterns.len(), path.as_ref().display() );
    Ok( () )
}

/// Reads itemsets written by `write_patterns`. A missing file is read as an empty set.
pub fn read_patterns<P: AsRef<Path>>( path: P ) -> Result<PatternSet<String>> {
    let file = match File::open( path.as_ref() ) {
	Ok( file ) => file,
	Err( err ) if err.kind() == std::io::ErrorKind::NotFound => {
	    warn!( "no itemsets at {}", path.as_ref().display() );
	    return Ok( PatternSet::new() );
	},
	Err( err ) => return Err( MineError::Io( err )),
    };
    let mut patterns = PatternSet::new();
    for line in BufReader::new( file ).lines() {
	let line = line?;
	if line.trim().is_empty() {
	    continue;
	}
	let pattern: FrequentItemset<String> = json::from_str( &line )?;
	patterns.insert( pattern.items, pattern.support );
    }
    Ok( patterns )
}

/// Creates a fimi string from an iterator over items
pub fn produce_fimi<T: Display, I: Iterator<Item = T>>( items: I, left_delimiter: &str, separator: &str, right_delimiter: &str ) -> String {
    let add_item_to_string = |mut fimi: String, i: T| {
	fimi.push_str( i.to_string().as_str() );
	fimi.push_str( separator );
	fimi
    };
    let mut fimi = String::new();
    fimi.push_str( left_delimiter );
    fimi = items.fold( fimi, add_item_to_string );
    fimi.push_str( right_delimiter );
    fimi
}

/// Writes a serializeable value to a file
pub fn write_json<M: serde::Serialize, P: AsRef<Path>>( value: &M, path: P ) -> Result<()> {
    let model_string = json::to_string( value )?;
    let mut file = File::create( path.as_ref() )?;
    write!( file, "{}", model_string )?;
    Ok( () )
}

pub fn read_json<M: serde::de::DeserializeOwned, P: AsRef<Path>>( path: P ) -> Result<M> {
    let reader = BufReader::new( File::open( path.as_ref() )? );
    Ok( json::from_reader( reader )? )
}

#[cfg(test)]
mod test {

    use super::*;
    use std::path::PathBuf;

    fn temp_path( name: &str ) -> PathBuf {
	std::env::temp_dir().join( format!( "fpmine-{}-{}", std::process::id(), name ))
    }

    fn labels( items: &[&str] ) -> LabelTransaction {
	items.iter().map( |l| l.to_string() ).collect()
    }

    #[test]
    fn transactions_survive_json_lines() {
	let path = temp_path( "transactions.jsonl" );
	let data = vec!( labels( &[ "milk", "bread" ] ), labels( &[ "eggs" ] ), labels( &[] ));
	write_transactions( &path, &data ).unwrap();
	let read = read_transactions( &path, InputFormat::Json ).unwrap();
	std::fs::remove_file( &path ).unwrap();
	assert_eq!( read, data );
    }

    #[test]
    fn plain_lines_split_on_whitespace() {
	let path = temp_path( "transactions.txt" );
	std::fs::write( &path, "a b  c\n\nd\n" ).unwrap();
	let read = read_transactions( &path, InputFormat::Plain ).unwrap();
	std::fs::remove_file( &path ).unwrap();
	assert_eq!( read, vec!( labels( &[ "a", "b", "c" ] ), labels( &[ "d" ] )));
    }

    #[test]
    fn unreadable_plain_line_is_an_error() {
	let path = temp_path( "unreadable.txt" );
	std::fs::write( &path, b"a b\n\xff\xfe c\na\n" ).unwrap();
	let result = read_transactions( &path, InputFormat::Plain );
	std::fs::remove_file( &path ).unwrap();
	assert!( matches!( result, Err( MineError::Io( _ ))));
    }

    #[test]
    fn broken_json_is_an_error() {
	let path = temp_path( "broken.jsonl" );
	std::fs::write( &path, "[\"a\"]\n{ \"a\": 1 }\n" ).unwrap();
	let result = read_transactions( &path, InputFormat::Json );
	std::fs::remove_file( &path ).unwrap();
	assert!( matches!( result, Err( MineError::Json( _ ))));
    }

    #[test]
    fn patterns_survive_json_lines() {
	let path = temp_path( "patterns.jsonl" );
	let mut patterns = PatternSet::new();
	patterns.insert( labels( &[ "a" ] ), 4 );
	patterns.insert( labels( &[ "a", "b" ] ), 2 );
	write_patterns( &path, &patterns ).unwrap();
	let read = read_patterns( &path ).unwrap();
	std::fs::remove_file( &path ).unwrap();
	assert_eq!( read, patterns );
	assert_eq!( read.support( &labels( &[ "b", "a" ] )).unwrap(), 2 );
    }

    #[test]
    fn missing_pattern_file_is_empty() {
	let read = read_patterns( temp_path( "never-written.jsonl" )).unwrap();
	assert!( read.is_empty() );
    }

    #[test]
    fn fimi_string() {
	assert_eq!( produce_fimi( [ 1, 2, 3 ].iter(), "(", ",", ")" ), "(1,2,3,)" );
    }
}
