use std::path::PathBuf;

use clap::Parser;

/// Generates C++ XML parser code from an XSD schema file.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// The input XSD schema file
    #[arg(value_parser)]
    pub input: PathBuf,

    /// Package of the generated code; dot-separated segments become
    /// nested namespaces
    #[arg(short = 'p', long = "package")]
    pub package: Option<String>,

    /// Output directory
    #[arg(short = 'o', long = "outDir", default_value = ".")]
    pub out_dir: PathBuf,

    /// Generate the C++ parser
    #[arg(short = 'c', long = "cpp")]
    pub cpp: bool,

    /// Generate the Java parser (not built into this binary)
    #[arg(short = 'j', long = "java", conflicts_with = "cpp")]
    pub java: bool,

    /// Also generate writing code
    #[arg(short = 'w', long = "writer")]
    pub writer: bool,

    /// Use isX() instead of getX() for boolean-typed members
    #[arg(short = 'b', long = "booleanGetter")]
    pub boolean_getter: bool,

    /// Generate code backed by tinyxml2 instead of libxml2
    #[arg(short = 't', long = "tinyxml")]
    pub tinyxml: bool,

    /// Populate only the enum files
    #[arg(short = 'e', long = "genEnumsOnly", conflicts_with = "gen_parser_only")]
    pub gen_enums_only: bool,

    /// Populate only the parser files
    #[arg(short = 'x', long = "genParserOnly")]
    pub gen_parser_only: bool,

    /// Restrict the generated entrypoints to this root element; may be
    /// repeated
    #[arg(short = 'r', long = "root")]
    pub root: Vec<String>,

    /// Write a dependency file listing all included schemas
    #[arg(short = 'd', long = "depfile")]
    pub depfile: Option<PathBuf>,
}
