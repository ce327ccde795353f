
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use tracing::level_filters::LevelFilter;

use fpmine::{Count, Item, Transaction, Encoder, FList, ItemIndex, MineError, Miner, HMiner, FpGrowthMiner};
use fpmine::{MiningConfig, Strategy, PatternSet, Tree, decode_results};
use fpmine::data::encode_transactions;
use fpmine::fptree::write_to_file;
use fpmine::io::{self, InputFormat, PrettyFormatter};
use fpmine::patterns::PatternFormatter;

/// Mines frequent itemsets from a batch of transactions
#[derive( Parser, Debug )]
#[command( name = "miner", version )]
struct Args {
    /// transaction file
    #[arg( required_unless_present = "resume" )]
    input: Option<PathBuf>,

    #[arg( long, value_enum, default_value_t = InputFormat::Json )]
    format: InputFormat,

    /// JSON file with mining settings, flags below override it
    #[arg( long )]
    config: Option<PathBuf>,

    #[arg( long )]
    min_support: Option<Count>,

    #[arg( long )]
    support_fraction: Option<f64>,

    /// -1 for no limit
    #[arg( long, allow_negative_numbers = true )]
    max_length: Option<i64>,

    /// itemsets kept per length, comma separated
    #[arg( long, value_delimiter = ',' )]
    top_k: Option<Vec<usize>>,

    #[arg( long, value_enum )]
    strategy: Option<Strategy>,

    /// write itemsets as JSON lines instead of printing them
    #[arg( short, long )]
    output: Option<PathBuf>,

    /// store the prefix tree before mining
    #[arg( long, conflicts_with = "resume" )]
    checkpoint: Option<PathBuf>,

    /// mine a stored prefix tree instead of reading transactions
    #[arg( long )]
    resume: Option<PathBuf>,

    /// check every support against a vertical index
    #[arg( long )]
    verify: bool,

    #[arg( short, long, action = ArgAction::Count )]
    verbose: u8,
}

/// Everything besides the tree that is needed to mine a checkpoint
#[derive( Serialize, Deserialize )]
struct CheckpointMeta {
    labels: Vec<String>,
    order: Vec<Item>,
    min_support: Count,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    prepare_logging( args.verbose );

    let config = resolve_config( &args ).map_err( |err| err.to_string() )?;
    let patterns = match &args.resume {
	Some( path ) => resume( path, &config ),
	None => mine( &args, &config ),
    }.map_err( |err| err.to_string() )?;

    match &args.output {
	Some( path ) => io::write_patterns( path, &patterns ).map_err( |err| err.to_string() )?,
	None => {
	    let mut formatter = PatternFormatter::new();
	    formatter.show_lengths();
	    print!( "{}", formatter.format_pretty( &patterns ));
	}
    }
    Ok( () )
}

fn prepare_logging( verbosity: u8 ) {
    let level = match verbosity {
	0 => LevelFilter::INFO,
	1 => LevelFilter::DEBUG,
	_ => LevelFilter::TRACE,
    };
    let subscriber = tracing_subscriber::fmt::fmt()
	.with_max_level( level )
	.with_writer( std::io::stderr )
	.finish();
    if tracing::subscriber::set_global_default( subscriber ).is_err() {
	eprintln!( "logging was already set up" );
    }
}

fn resolve_config( args: &Args ) -> fpmine::Result<MiningConfig> {
    let mut config = match &args.config {
	Some( path ) => MiningConfig::load( path )?,
	None => MiningConfig::default(),
    };
    if let Some( min_support ) = args.min_support {
	config.min_support = min_support;
    }
    if args.support_fraction.is_some() {
	config.support_fraction = args.support_fraction;
    }
    if let Some( max_length ) = args.max_length {
	config.max_length = max_length;
    }
    if let Some( top_k ) = &args.top_k {
	config.top_k_per_length = top_k.clone();
    }
    if let Some( strategy ) = args.strategy {
	config.strategy = strategy;
    }
    config.validate()?;
    Ok( config )
}

fn mine( args: &Args, config: &MiningConfig ) -> fpmine::Result<PatternSet<String>> {
    let Some( input ) = &args.input else {
	return Err( MineError::Config( "no input file".to_string() ));
    };
    let _span = info_span!( "mine", input = %input.display() ).entered();
    let transactions = io::read_transactions( input, args.format )?;
    let (encoded, encoder) = encode_transactions( &transactions );
    let min_support = config.min_support_for( encoded.len() );
    info!( "{} transactions over {} items, min support {}", encoded.len(), encoder.len(), min_support );

    let raw = match (config.strategy, &args.checkpoint) {
	(Strategy::HMine, None) => HMiner::new( config.max_length() ).mine( &encoded, min_support )?,
	(strategy, checkpoint) => {
	    if strategy == Strategy::HMine {
		warn!( "checkpoints hold prefix trees, mining with fp-growth" );
	    }
	    let flist = FList::build( &encoded, min_support );
	    let tree = FpGrowthMiner::build_tree( &flist, &encoded )?;
	    if let Some( path ) = checkpoint {
		store_checkpoint( path, &tree, &encoder, &flist )?;
	    }
	    FpGrowthMiner::new( config.max_length() ).mine_tree( &tree, flist.items(), min_support )?
	}
    };

    if args.verify {
	verify( &raw, &encoded )?;
    }
    decode_results( &encoder, &raw, config.max_length(), &config.top_k_per_length )
}

fn store_checkpoint( path: &Path, tree: &Tree, encoder: &Encoder, flist: &FList ) -> fpmine::Result<()> {
    write_to_file( path, &tree.serialize()? )?;
    let meta = CheckpointMeta {
	labels: encoder.labels().to_vec(),
	order: flist.items().to_vec(),
	min_support: flist.min_support(),
    };
    io::write_json( &meta, meta_path( path ))
}

fn resume( path: &Path, config: &MiningConfig ) -> fpmine::Result<PatternSet<String>> {
    let _span = info_span!( "resume", checkpoint = %path.display() ).entered();
    let tree = Tree::rebuild_from_file( path )?;
    let meta: CheckpointMeta = io::read_json( meta_path( path ))?;
    let encoder = Encoder::from_labels( meta.labels );
    tree.check_chains()?;
    info!( "resumed tree of {} transactions", tree.transaction_count() );

    let min_support = config.min_support_for( tree.transaction_count() as usize ).max( meta.min_support );
    let raw = FpGrowthMiner::new( config.max_length() ).mine_tree( &tree, &meta.order, min_support )?;
    decode_results( &encoder, &raw, config.max_length(), &config.top_k_per_length )
}

fn verify( patterns: &PatternSet, transactions: &[Transaction] ) -> fpmine::Result<()> {
    let index = ItemIndex::new( transactions );
    for pattern in patterns.iter() {
	let expected = index.support( &pattern.items );
	if expected != pattern.support {
	    return Err( MineError::SupportMismatch { itemset: format!( "{:?}", pattern.items ), expected, mined: pattern.support } );
	}
    }
    info!( "verified {} itemsets", patterns.len() );
    Ok( () )
}

fn meta_path( checkpoint: &Path ) -> PathBuf {
    let mut path = checkpoint.as_os_str().to_owned();
    path.push( ".meta.json" );
    PathBuf::from( path )
}
