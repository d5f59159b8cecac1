use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wlan_portal_client::screens::{
    AccessPointDetails, AccessPoints, ClientDevices, LogNotifier, Network, ProfileDetails,
    ScreenContext, View,
};
use wlan_portal_client::{
    ClientConfig, FileTokenStore, GraphQLClient, HttpTransport, ReauthInterceptor, Session,
    TokenStore,
};

mod cli;

use cli::{Cli, Commands, ProfileCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "wlan_portal_client=info,wlan_portal=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    let mut config = ClientConfig::load()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::with_key(
        &config.token_file,
        &config.token_key,
    ));
    let session = Session::initialize(store.clone());
    let http = HttpTransport::with_timeout(&config.endpoint, store, config.request_timeout)?;
    let client = GraphQLClient::new(ReauthInterceptor::new(http, session.clone()));

    tracing::debug!(endpoint = %config.endpoint, "client configured");

    match args.command {
        Commands::Login { email, password } => {
            let identity = client.login(&session, &email, &password).await?;
            println!("Logged in as {} (customer {})", identity.user_name, identity.customer_id);
        }
        Commands::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => match session.identity() {
            Some(identity) => {
                println!("{}", serde_json::to_string_pretty(&identity)?);
                let access = if identity.is_super_user() { "yes" } else { "no" };
                println!("accounts area: {access}");
            }
            None => bail!("not logged in"),
        },
        command => {
            let ctx = ScreenContext::new(client, &session, Arc::new(LogNotifier))
                .context("not logged in; run `wlan-portal login` first")?;
            run_screen(ctx, &config, command).await?;
        }
    }

    Ok(())
}

async fn run_screen(ctx: ScreenContext, config: &ClientConfig, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::AccessPoints { locations, more } => {
            let mut screen = AccessPoints::new(ctx);
            screen.set_checked_locations(locations).await;
            for _ in 0..more {
                if screen.is_last_page() {
                    break;
                }
                screen.load_more().await;
            }
            if let View::Error(message) = screen.render() {
                bail!(message);
            }
            for row in screen.rows() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.name,
                    row.mac.as_deref().unwrap_or("-"),
                    row.ip.as_deref().unwrap_or("-"),
                    row.up_time.as_deref().unwrap_or("-"),
                    row.devices.join("/"),
                );
            }
        }
        Commands::AccessPoint { id } => {
            let mut screen = AccessPointDetails::new(ctx, id, config.metrics_window);
            screen.load().await;
            match screen.render() {
                View::Page(data) => {
                    println!("{}", serde_json::to_string_pretty(&data.equipment.details)?);
                    println!("{} firmware versions available", data.firmware.len());
                }
                View::Error(message) => bail!(message),
                View::Loading | View::Redirect(_) => {}
            }
            let metrics = screen.metrics();
            match metrics.error {
                Some(message) => eprintln!("{message}"),
                None => println!("{} metric samples", metrics.items.len()),
            }
        }
        Commands::Profile { command } => match command {
            ProfileCommands::Show { id } => {
                let mut screen = ProfileDetails::new(ctx, id);
                screen.load().await;
                match screen.render() {
                    View::Page(data) => println!(
                        "{} ({})\n{}",
                        data.profile.name,
                        data.profile.profile_type,
                        serde_json::to_string_pretty(&data.profile.details)?
                    ),
                    View::Error(message) => bail!(message),
                    View::Loading | View::Redirect(_) => {}
                }
            }
            ProfileCommands::Delete { id } => {
                let mut screen = ProfileDetails::new(ctx, id);
                if !screen.delete_profile().await {
                    bail!("profile could not be deleted");
                }
            }
        },
        Commands::ClientDevices { more, mac } => {
            let mut screen = ClientDevices::new(ctx);
            if let Some(mac) = mac {
                match screen.client_session(&mac).await? {
                    Some(session) => println!("{session:#?}"),
                    None => bail!("no session for {mac}"),
                }
                return Ok(());
            }
            screen.load().await;
            for _ in 0..more {
                if screen.is_last_page() {
                    break;
                }
                screen.load_more().await;
            }
            if let View::Error(message) = screen.render() {
                bail!(message);
            }
            for device in screen.devices() {
                println!(
                    "{}\t{}\t{}",
                    device.mac_address,
                    device.ip_address.as_deref().unwrap_or("-"),
                    device.ssid.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Locations => {
            let mut screen = Network::new(ctx);
            screen.load().await;
            if let View::Error(message) = screen.render() {
                bail!(message);
            }
            for location in screen.locations() {
                println!(
                    "{}\t{}\t{}",
                    location.id,
                    location.name,
                    location.location_type.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Login { .. } | Commands::Logout | Commands::Whoami => {}
    }
    Ok(())
}
