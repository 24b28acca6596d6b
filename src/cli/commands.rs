use std::path::Path;

use tracing::{info, warn};

use crate::cli::config::{CategoryAction, ResolvedPaths};
use crate::filter::category::{CategoryFilter, CategorySettings, category_tree};
use crate::identity::field_key::FieldKey;
use crate::identity::object_id::{ObjectId, Resolution, resolve_identity};
use crate::report::console::{format_category_tree, format_console_report};
use crate::report::report_model::ReviewReport;
use crate::scene::document::SceneDocument;
use crate::scene::scene_model::{ObjectRef, SceneGraph};
use crate::session::session::{AckMode, Session};
use crate::store::kv_store::JsonFileStore;
use crate::trace::logger::EventLogger;
use crate::trace::trace::SessionEvent;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

type DocumentSession = Session<SceneDocument, JsonFileStore, CategorySettings>;

/// Everything one command invocation works on.
struct Workspace {
    scene_name: String,
    document: SceneDocument,
    session: DocumentSession,
    events: EventLogger,
}

fn open_workspace(paths: &ResolvedPaths) -> CliResult<Workspace> {
    let document = SceneDocument::load(&paths.scene)?;
    ensure_parent(&paths.store)?;
    let store = JsonFileStore::open(&paths.store)?;
    let settings = CategorySettings::load(&paths.settings)?;

    let session = Session::open(&document, store, settings)?;
    let events = match &paths.event_log {
        Some(path) => EventLogger::new(path),
        None => EventLogger::disabled(),
    };

    Ok(Workspace {
        scene_name: scene_name(&paths.scene),
        document,
        session,
        events,
    })
}

fn save_settings(paths: &ResolvedPaths, settings: &CategorySettings) -> CliResult<()> {
    ensure_parent(&paths.settings)?;
    settings.save(&paths.settings)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn scene_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene")
        .to_string()
}

// ============================================================================
// scan subcommand
// ============================================================================

/// Scan and print the review list. Returns the number of fields to review.
pub fn cmd_scan(
    paths: &ResolvedPaths,
    format: &str,
    include_acknowledged: bool,
    output: Option<&str>,
) -> CliResult<usize> {
    let mut ws = open_workspace(paths)?;
    let outcome = ws.session.last_outcome().clone();

    let report = ReviewReport::build(
        &mut ws.session,
        &ws.document,
        &ws.scene_name,
        outcome.clone(),
        include_acknowledged,
    )?;
    save_settings(paths, ws.session.filter())?;

    ws.events
        .log(&SessionEvent::now("scan", &ws.scene_name).with_outcome(&outcome));

    let output_content = match format {
        "json" => serde_json::to_string_pretty(&report)? + "\n",
        _ => format_console_report(&report),
    };

    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(report.visible_count())
}

// ============================================================================
// ack / ack-all / reset subcommands
// ============================================================================

pub fn cmd_ack(paths: &ResolvedPaths, id: &str, property_path: &str) -> CliResult<()> {
    let mut ws = open_workspace(paths)?;
    let key = FieldKey::new(ObjectId::from_raw(id), property_path);

    // A node id would make every later reconciliation fail; refuse before writing
    if resolve_identity(&ws.document, &key.object_id)?.is_stale() {
        warn!(key = %key, "acknowledging a field of a behavior not in this scene");
    } else if !ws.session.scanner().is_known(&key) {
        warn!(key = %key, "acknowledging a field the scan did not report");
    }

    let added = ws.session.acknowledge(&key)?;
    ws.events
        .log(&SessionEvent::now("acknowledge", &ws.scene_name).with_key(&key));

    if added {
        println!("Acknowledged {}", key);
    } else {
        println!("Already acknowledged {}", key);
    }
    Ok(())
}

pub fn cmd_ack_all(paths: &ResolvedPaths, mode: &str) -> CliResult<()> {
    let mode: AckMode = mode.parse()?;
    let mut ws = open_workspace(paths)?;

    let keys = ws.session.acknowledge_all_matching(&ws.document, mode)?;
    ws.events.log(
        &SessionEvent::now("acknowledge_all", &ws.scene_name)
            .with_keys(&keys)
            .with_detail(mode),
    );

    println!("Acknowledged {} field(s) ({})", keys.len(), mode);
    Ok(())
}

pub fn cmd_reset(paths: &ResolvedPaths) -> CliResult<()> {
    let mut ws = open_workspace(paths)?;
    let cleared = ws.session.store().record_count();

    ws.session.reset_all()?;
    ws.events.log(
        &SessionEvent::now("reset", &ws.scene_name).with_detail(format!("{cleared} records")),
    );

    println!("Cleared {} acknowledgment record(s)", cleared);
    Ok(())
}

// ============================================================================
// assign / resolve subcommands
// ============================================================================

pub fn cmd_assign(
    paths: &ResolvedPaths,
    id: &str,
    property_path: &str,
    value: Option<&str>,
) -> CliResult<()> {
    let mut ws = open_workspace(paths)?;
    let key = FieldKey::new(ObjectId::from_raw(id), property_path);
    let value = value.map(|v| ObjectRef(v.to_string()));

    if !ws.session.assign(&mut ws.document, &key, value.clone())? {
        return Err(format!("object {} no longer exists in this scene", id).into());
    }
    ws.document.save(&paths.scene)?;

    let shown = value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string());
    ws.events.log(
        &SessionEvent::now("assign", &ws.scene_name)
            .with_key(&key)
            .with_detail(&shown),
    );
    info!(key = %key, value = %shown, "field written");

    println!("Set {} = {}", key, shown);
    Ok(())
}

pub fn cmd_resolve(paths: &ResolvedPaths, id: &str) -> CliResult<()> {
    let document = SceneDocument::load(&paths.scene)?;

    match resolve_identity(&document, &ObjectId::from_raw(id))? {
        Resolution::Live { node, behavior } => {
            let node_path = document.node_path(&node).unwrap_or_default();
            let behavior_type = document.behavior_type(&behavior);
            println!("{} > {}", node_path, behavior_type.name);
        }
        Resolution::Stale => println!("{} is stale (no such behavior)", id),
    }
    Ok(())
}

// ============================================================================
// categories subcommand
// ============================================================================

pub fn cmd_categories(paths: &ResolvedPaths, action: &CategoryAction) -> CliResult<()> {
    let document = SceneDocument::load(&paths.scene)?;
    let types = document.declared_types();

    let mut settings = CategorySettings::load(&paths.settings)?;
    settings.register_types(&types);

    if let CategoryAction::Enable { category } | CategoryAction::Disable { category } = action {
        if !settings.all_categories().contains(category) {
            warn!(category = %category, "no declared type uses this category");
        }
    }

    match action {
        CategoryAction::List => {}
        CategoryAction::Enable { category } => settings.set(category, true),
        CategoryAction::Disable { category } => settings.set(category, false),
        CategoryAction::AllOn => settings.set_all(true),
        CategoryAction::AllOff => settings.set_all(false),
        CategoryAction::Defaults => settings.restore_defaults(),
    }

    if *action != CategoryAction::List {
        save_settings(paths, &settings)?;
    }

    print!("{}", format_category_tree(&category_tree(&types), &settings));
    Ok(())
}
