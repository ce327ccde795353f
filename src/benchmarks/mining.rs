use tracing::{info, debug};
use tracing::level_filters::LevelFilter;

use rand::prelude::*;
use statrs::distribution::DiscreteUniform;

use std::time::*;

use fpmine::*;
use fpmine::data::compute_support;

fn main() -> std::result::Result<(), String> {
    prepare_logging();

    let number_items = 60;
    let data = generate_transactions( 20000, number_items, 12 )?;
    let min_support = compute_support( 0.02, data.len() );
    info!( "{} random transactions over {} items, min support {}", data.len(), number_items, min_support );

    let hmine = benchmark_miner( "h-mine", &mut HMiner::new( None ), &data, min_support )?;
    let fpgrowth = benchmark_miner( "fp-growth", &mut FpGrowthMiner::new( None ), &data, min_support )?;
    if hmine != fpgrowth {
	return Err( "miners disagree".to_string() );
    }
    check_sample( &hmine, &data, 1000 )?;
    benchmark_self_ordering( &data )?;

    Ok( () )
}

fn prepare_logging() {
    let subscriber = tracing_subscriber::fmt::fmt()
	.with_max_level( LevelFilter::INFO )
	.finish();
    if tracing::subscriber::set_global_default( subscriber ).is_err() {
	eprintln!( "logging was already set up" );
    }
}

fn benchmark_miner<M: Miner>( name: &str, miner: &mut M, data: &[Transaction], min_support: Count ) -> std::result::Result<PatternSet, String> {
    info!( "Start benchmark: {name}" );
    let start = Instant::now();
    let patterns = miner.mine( data, min_support ).map_err( |err| err.to_string() )?;
    let time = Instant::now().duration_since( start );
    let lengths: Vec<usize> = patterns.lengths().map( |length| patterns.bucket( length ).len() ).collect();
    info!( "Result: {} itemsets in {}ms, by length {lengths:?}", patterns.len(), time.as_millis() );
    Ok( patterns )
}

fn benchmark_self_ordering( data: &[Transaction] ) -> std::result::Result<(), String> {
    info!( "Start benchmark: self-ordering insertion" );
    let start = Instant::now();
    let mut tree = Tree::new();
    for transaction in data {
	tree.insert_and_order_transaction( transaction ).map_err( |err| err.to_string() )?;
    }
    let time = Instant::now().duration_since( start );
    tree.check_chains().map_err( |err| err.to_string() )?;
    info!( "Result: {} nodes after {} insertions in {}ms", tree.node_count(), data.len(), time.as_millis() );
    Ok( () )
}

/// Compares the supports of randomly picked itemsets against a vertical index
fn check_sample( patterns: &PatternSet, data: &[Transaction], sample_size: usize ) -> std::result::Result<(), String> {
    let index = ItemIndex::new( data );
    let all: Vec<&FrequentItemset> = patterns.iter().collect();
    let mut gen = thread_rng();
    for pattern in all.choose_multiple( &mut gen, sample_size ) {
	let expected = index.support( &pattern.items );
	if expected != pattern.support {
	    return Err( format!( "{:?} mined with {} but occurs {} times", pattern.items, pattern.support, expected ));
	}
    }
    info!( "checked {} of {} itemsets", sample_size.min( all.len() ), all.len() );
    Ok( () )
}

/// Transactions whose lengths are uniform in 1 ..= max_length. Items are skewed towards small codes.
fn generate_transactions( number_transactions: usize, number_items: usize, max_length: usize ) -> std::result::Result<Vec<Transaction>, String> {
    let length_distribution = DiscreteUniform::new( 1, max_length as i64 ).map_err( |err| err.to_string() )?;
    let mut universe: Vec<Item> = ( 0 .. number_items ).collect();
    let mut gen = thread_rng();
    let data: Vec<Transaction> = ( 0 .. number_transactions )
	.map( |_| {
	    let length = length_distribution.sample( &mut gen ) as usize;
	    generate_random_transaction( &mut universe, length, &mut gen )
	}).collect();
    debug!( "average length {:.2}", data.iter().map( |t| t.len() ).sum::<usize>() as f64 / number_transactions as f64 );
    Ok( data )
}

fn generate_random_transaction( universe: &mut [Item], length: usize, gen: &mut ThreadRng ) -> Transaction {
    let size = universe.len().max( 1 );
    let length = length.min( universe.len() );
    let (chosen, _) = universe.partial_shuffle( gen, length );
    // fold the draws towards the front of the universe, so some items are much more frequent than others
    let mut transaction: Transaction = chosen.iter().map( |item| item * item / size ).collect();
    transaction.sort_unstable();
    transaction.dedup();
    transaction
}
