use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for Movable Type compatible blogs.
///
/// Post documents are read from standard input and written to standard
/// output; progress messages go to standard error.
#[derive(Parser, Debug)]
#[command(name = "mtpost", version, about, long_about = None)]
pub struct Cli {
    /// Blog alias from the configuration file
    #[arg(short = 'a', long = "alias", global = true)]
    pub alias: Option<String>,

    /// Configuration file [default: ~/.mtpost.toml]
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// HTTP proxy, `[scheme://][user[:pass]@]host[:port]`
    #[arg(long, global = true, env = "HTTP_PROXY", hide_env_values = true)]
    pub proxy: Option<String>,

    /// Increase verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease verbosity (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the blogs the account on SITE can post to
    Blogs { site: String },

    /// List the categories of the blog
    Categories,

    /// Replace a post with the document on standard input
    Edit {
        /// Post id, or `-` to take it from the document's POSTID
        post_id: String,
    },

    /// Print a post as an editable document
    Get {
        /// Post id, or `-` for the most recent post
        post_id: String,
    },

    /// List recent posts
    List {
        #[arg(default_value_t = 5)]
        count: i32,
    },

    /// Create a post from the document on standard input
    New,

    /// List the trackback pings of a post
    Pings { post_id: String },

    /// Rebuild the static pages of a post
    Rebuild { post_id: String },

    /// List the text filters usable in CONVERT BREAKS
    Filters,

    /// Upload standard input as FILENAME and print its URL
    Upload { filename: String },

    /// Delete a post
    Delete { post_id: String },
}

impl Cli {
    /// Effective verbosity: 1 by default, raised by `-v`, lowered by `-q`.
    pub fn verbosity(&self) -> i32 {
        1 + i32::from(self.verbose) - i32::from(self.quiet)
    }

    /// The proxy to use: `--proxy`, `HTTP_PROXY`, then `http_proxy`.
    pub fn proxy_spec(&self) -> Option<String> {
        self.proxy
            .clone()
            .or_else(|| std::env::var("http_proxy").ok())
            .filter(|spec| !spec.trim().is_empty())
    }
}

impl Command {
    /// Site named on the command line, for commands that bypass the blog
    /// alias.
    pub fn site(&self) -> Option<&str> {
        match self {
            Command::Blogs { site } => Some(site),
            _ => None,
        }
    }
}
