use clap::{Parser, Subcommand};

/// wlan-portal: command line access to the WLAN cloud portal
#[derive(Parser)]
#[command(name = "wlan-portal", version, about)]
pub struct Cli {
    /// GraphQL endpoint (overrides WLAN_PORTAL_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the token pair
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "WLAN_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Remove the stored token pair
    Logout,

    /// Show the identity of the stored session
    Whoami,

    /// List access points of the given locations
    AccessPoints {
        #[arg(long, value_delimiter = ',')]
        locations: Vec<String>,
        /// Pages to fetch beyond the first
        #[arg(long, default_value = "0")]
        more: usize,
    },

    /// Show one access point with its recent metrics
    AccessPoint { id: String },

    /// Inspect or delete profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// List connected client devices
    ClientDevices {
        #[arg(long, default_value = "0")]
        more: usize,
        /// Show one session instead of the list
        #[arg(long)]
        mac: Option<String>,
    },

    /// List network locations
    Locations,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show a profile
    Show { id: String },
    /// Delete a profile
    Delete { id: String },
}
