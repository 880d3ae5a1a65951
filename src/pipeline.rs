//! Watch-mode build pipeline.
//!
//! Consumes the monitor's event stream and keeps an observable set of
//! compiled diagrams up to date: created and changed sources are
//! recompiled, deleted sources drop out of the set, renames re-key the
//! existing entry. Consumers observe the set directly (or mirror it
//! into their own collection, see [`crate::mirror`]).
//!
//! The pipeline holds `Rc`-based state, so its future is not `Send`;
//! it is driven by `block_on` from the main thread.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::compiler::decode::DiagramImage;
use crate::compiler::error::{CompileError, DiagramError};
use crate::compiler::request::{CompileRequest, ImageFormat};
use crate::compiler::{DiagramCompiler, DiagramResult};
use crate::exec::ExecError;
use crate::logger;
use crate::mirror::ObservableList;
use crate::watch::FsEvent;

/// One diagram tracked by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub path: PathBuf,
    /// Last successfully compiled image. Kept through failed rebuilds
    /// so consumers can keep showing the previous good render.
    pub image: Option<DiagramImage>,
    /// Errors from the last compile attempt; empty means up to date.
    pub errors: Vec<DiagramError>,
}

/// Observable set of tracked diagrams, ordered by first appearance.
pub type DiagramSet = ObservableList<Diagram>;

pub struct Pipeline {
    compiler: DiagramCompiler,
    set: DiagramSet,
    format: ImageFormat,
    charset: String,
}

impl Pipeline {
    pub fn new(compiler: DiagramCompiler, format: ImageFormat, charset: impl Into<String>) -> Self {
        Self {
            compiler,
            set: ObservableList::new(),
            format,
            charset: charset.into(),
        }
    }

    /// Handle to the diagram set. Cloning shares the underlying list.
    pub fn diagrams(&self) -> DiagramSet {
        self.set.clone()
    }

    /// Drive the pipeline until cancellation or the monitor goes away.
    pub async fn run(&self, mut events: mpsc::Receiver<FsEvent>, cancel: &CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                maybe = events.recv() => {
                    let Some(event) = maybe else { break };
                    self.handle(event, cancel).await;
                }
            }
        }
    }

    async fn handle(&self, event: FsEvent, cancel: &CancellationToken) {
        match event {
            FsEvent::Created(path) | FsEvent::Changed(path) => {
                self.rebuild(path, cancel).await;
            }
            FsEvent::Deleted(path) => {
                if let Some(i) = self.set.position(|d| d.path == path) {
                    self.set.remove(i);
                    logger::status_unchanged(&format!("removed {}", path.display()));
                }
            }
            FsEvent::Renamed { from, to } => match self.set.position(|d| d.path == from) {
                // Re-key in place; the content did not change.
                Some(i) => {
                    if let Some(mut diagram) = self.set.get(i) {
                        diagram.path = to;
                        self.set.replace(i, diagram);
                    }
                }
                // Renamed into the watched name set: treat as new.
                None => self.rebuild(to, cancel).await,
            },
            FsEvent::Error(message) => {
                crate::log!("error"; "watch error: {message}");
            }
        }
    }

    /// Recompile one source file and fold the outcome into the set.
    async fn rebuild(&self, path: PathBuf, cancel: &CancellationToken) {
        crate::debug!("compile"; "building {}", path.display());
        let req = CompileRequest::from_file(&path, self.format).with_charset(&self.charset);

        match self.compiler.compile_to_image(&req, cancel).await {
            Ok(DiagramResult::Success(image)) => {
                logger::status_success(&format!("compiled {}", path.display()));
                self.upsert(path, Some(image), Vec::new());
            }
            Ok(DiagramResult::Failure(errors)) => {
                let detail = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                logger::status_error(&format!("failed {}", path.display()), &detail);
                self.upsert(path, None, errors);
            }
            Err(CompileError::Exec(ExecError::Cancelled)) => {}
            Err(e) => {
                // Transport failure, not a diagram error. The entry keeps
                // its previous state.
                crate::log!("error"; "{}: {e}", path.display());
            }
        }
    }

    /// Insert or update the entry for `path`. A `None` image preserves
    /// the previous successful render.
    fn upsert(&self, path: PathBuf, image: Option<DiagramImage>, errors: Vec<DiagramError>) {
        match self.set.position(|d| d.path == path) {
            Some(i) => {
                let image = image.or_else(|| self.set.get(i).and_then(|d| d.image));
                self.set.replace(i, Diagram { path, image, errors });
            }
            None => self.set.push(Diagram {
                path,
                image,
                errors,
            }),
        }
    }
}

// ============================================================================
// Tests (fake compiler scripts, events injected directly)
// ============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    use crate::compiler::CompilerSettings;

    fn fake_compiler(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("fakeuml");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.display().to_string()
    }

    fn pipeline_for(program: String) -> Pipeline {
        let compiler = DiagramCompiler::new(CompilerSettings {
            program,
            ..CompilerSettings::default()
        });
        Pipeline::new(compiler, ImageFormat::Vector, "UTF-8")
    }

    const SVG_BODY: &str =
        r#"printf '<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>'"#;

    /// Run the pipeline over a fixed event sequence to completion.
    async fn drive(pipeline: &Pipeline, events: Vec<FsEvent>) {
        let (tx, rx) = mpsc::channel(16);
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx); // closes the channel, run() returns after draining
        pipeline.run(rx, &CancellationToken::new()).await;
    }

    fn source_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "@startuml\na -> b\n@enduml\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_created_source_enters_the_set() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let flow = source_file(&dir, "flow.puml");

        drive(&pipeline, vec![FsEvent::Created(flow.clone())]).await;

        let set = pipeline.diagrams();
        assert_eq!(set.len(), 1);
        let diagram = set.get(0).unwrap();
        assert_eq!(diagram.path, flow);
        assert!(diagram.errors.is_empty());
        assert_eq!(diagram.image.unwrap().width, 10);
    }

    #[tokio::test]
    async fn test_change_updates_not_duplicates() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let flow = source_file(&dir, "flow.puml");

        drive(
            &pipeline,
            vec![FsEvent::Created(flow.clone()), FsEvent::Changed(flow)],
        )
        .await;

        assert_eq!(pipeline.diagrams().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_last_image() {
        let dir = TempDir::new().unwrap();
        // Succeeds on the first run, emits an error block afterwards.
        let marker = dir.path().join("ran-once");
        let body = format!(
            "if [ -e {m} ]; then printf 'ERROR\\n5\\nSyntax Error?\\n' 1>&2; \
             else touch {m}; {SVG_BODY}; fi",
            m = marker.display()
        );
        let pipeline = pipeline_for(fake_compiler(&dir, &body));
        let flow = source_file(&dir, "flow.puml");

        drive(
            &pipeline,
            vec![FsEvent::Created(flow.clone()), FsEvent::Changed(flow)],
        )
        .await;

        let diagram = pipeline.diagrams().get(0).unwrap();
        assert_eq!(diagram.errors.len(), 1);
        assert_eq!(diagram.errors[0].line, 5);
        assert!(diagram.image.is_some(), "previous good render kept");
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let flow = source_file(&dir, "flow.puml");

        drive(
            &pipeline,
            vec![FsEvent::Created(flow.clone()), FsEvent::Deleted(flow)],
        )
        .await;

        assert!(pipeline.diagrams().is_empty());
    }

    #[tokio::test]
    async fn test_rename_rekeys_without_rebuild() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let old = source_file(&dir, "old.puml");
        let new = dir.path().join("new.puml");

        drive(
            &pipeline,
            vec![
                FsEvent::Created(old.clone()),
                FsEvent::Renamed {
                    from: old,
                    to: new.clone(),
                },
            ],
        )
        .await;

        let set = pipeline.diagrams();
        assert_eq!(set.len(), 1);
        let diagram = set.get(0).unwrap();
        assert_eq!(diagram.path, new);
        assert!(diagram.image.is_some());
    }

    #[tokio::test]
    async fn test_rename_of_unknown_source_compiles_it() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let flow = source_file(&dir, "flow.puml");

        drive(
            &pipeline,
            vec![FsEvent::Renamed {
                from: dir.path().join("draft.txt"),
                to: flow.clone(),
            }],
        )
        .await;

        let set = pipeline.diagrams();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().path, flow);
    }

    #[tokio::test]
    async fn test_watch_error_does_not_disturb_the_set() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));
        let flow = source_file(&dir, "flow.puml");

        drive(
            &pipeline,
            vec![
                FsEvent::Created(flow),
                FsEvent::Error("queue overflow".into()),
            ],
        )
        .await;

        assert_eq!(pipeline.diagrams().len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_for(fake_compiler(&dir, SVG_BODY));

        let (_tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Returns immediately despite the channel staying open.
        pipeline.run(rx, &cancel).await;
        assert!(pipeline.diagrams().is_empty());
    }
}
