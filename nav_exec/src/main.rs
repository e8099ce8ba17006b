//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the supervisor, planner and telemetry
//!     - Main loop, at the configured rate:
//!         - Drain inbound messages (poses, grids, routes)
//!         - Plan towards the active waypoint and publish the stitched path
//!         - Evaluate progress along the route
//!         - Publish the vehicle state
//!
//! Inbound messages are read either from a feed script, if a path to one is given, or as JSON
//! lines from stdin.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use structopt::StructOpt;

// Internal
use comms_if::inbound::InboundMsg;
use nav_lib::{
    inbox::{ChannelInbox, ScriptInbox},
    nav_loop::NavLoop,
    params::NavExecParams,
    planner::{AstarParams, AstarPlanner},
    supervisor::WaypointSupervisor,
    tm::ArchiveTm,
};
use util::{
    feed_script::FeedScript,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Waypoint navigation supervisor")]
struct Args {
    /// Feed script to replay inbound messages from. If not given messages are read from stdin as
    /// one JSON message per line.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Executable parameter file, relative to $NAV_SW_ROOT/params
    #[structopt(long, default_value = "nav_exec.toml")]
    params: String,

    /// Planner parameter file, relative to $NAV_SW_ROOT/params
    #[structopt(long, default_value = "astar.toml")]
    planner_params: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Navigation Supervisor Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let params: NavExecParams =
        util::params::load(&args.params).wrap_err("Could not load nav_exec params")?;
    let astar_params: AstarParams =
        util::params::load(&args.planner_params).wrap_err("Could not load planner params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut supervisor = WaypointSupervisor::default();
    supervisor
        .init(params.supervisor.clone())
        .wrap_err("Failed to initialise WaypointSupervisor")?;

    let planner = AstarPlanner::new(astar_params);
    info!("AstarPlanner init complete");

    let tm = ArchiveTm::new(&session).wrap_err("Failed to initialise the telemetry archive")?;
    info!("Telemetry archive init complete");

    let mut nav_loop = NavLoop::new(&params, supervisor, planner, tm)
        .wrap_err("Failed to initialise the replanning loop")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let reason = match args.script {
        Some(ref path) => {
            info!("Loading feed script from {:?}", path);
            let script = FeedScript::load(path).wrap_err("Failed to load feed script")?;
            let mut inbox = ScriptInbox::new(script);

            nav_loop.run(&mut inbox)
        }
        None => {
            info!("No script provided, reading messages from stdin\n");
            let (tx, mut inbox) = ChannelInbox::new();
            thread::spawn(move || read_stdin(tx));

            nav_loop.run(&mut inbox)
        }
    };

    // ---- SHUTDOWN ----

    info!("End of execution ({:?})", reason);

    Ok(())
}

/// Forward JSON lines from stdin into the inbox until stdin closes.
fn read_stdin(tx: Sender<InboundMsg>) {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Could not read from stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match InboundMsg::from_json(&line) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Could not parse inbound message: {}", e),
        }
    }

    info!("Stdin closed, no more messages will be received");
}
