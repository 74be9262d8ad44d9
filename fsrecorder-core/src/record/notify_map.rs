use crate::record::detector::Notification;
use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use std::path::Path;

/// Flatten one raw notifier event into the detector's notification shape.
/// Rename pairs become a single move; lone rename halves degrade to
/// delete/create. Access-only events are dropped.
pub fn map_event(ev: &notify::Event) -> Vec<Notification> {
    match ev.kind {
        EventKind::Create(kind) => ev
            .paths
            .iter()
            .map(|p| Notification::Created {
                path: p.clone(),
                is_dir: matches!(kind, CreateKind::Folder) || p.is_dir(),
            })
            .collect(),

        EventKind::Remove(kind) => ev
            .paths
            .iter()
            .map(|p| Notification::Deleted {
                path: p.clone(),
                is_dir: matches!(kind, RemoveKind::Folder),
            })
            .collect(),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both | RenameMode::Any if ev.paths.len() == 2 => {
                vec![Notification::Moved {
                    src: ev.paths[0].clone(),
                    dest: ev.paths[1].clone(),
                    is_dir: ev.paths[1].is_dir(),
                }]
            }
            RenameMode::From => ev
                .paths
                .iter()
                .map(|p| Notification::Deleted {
                    path: p.clone(),
                    is_dir: false,
                })
                .collect(),
            RenameMode::To => ev
                .paths
                .iter()
                .map(|p| Notification::Created {
                    path: p.clone(),
                    is_dir: p.is_dir(),
                })
                .collect(),
            _ => modified(&ev.paths),
        },

        EventKind::Modify(_) => modified(&ev.paths),

        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn modified(paths: &[std::path::PathBuf]) -> Vec<Notification> {
    paths
        .iter()
        .map(|p| Notification::Modified {
            path: p.clone(),
            is_dir: is_dir(p),
        })
        .collect()
}

fn is_dir(p: &Path) -> bool {
    std::fs::metadata(p).map(|md| md.is_dir()).unwrap_or(false)
}
