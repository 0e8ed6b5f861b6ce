//! Import orchestrator
//!
//! Drives the reconciliation of a set of AsyncAPI documents:
//!
//! 1. every document is loaded and validated before anything is written
//! 2. test modes import into prefixed, disposable domains: the domains are
//!    deleted up front, every document is applied, then every document is
//!    re-applied in checkmode and each task must report `NOTHING_TO_DO`
//! 3. release mode runs the test sequence first and then applies the
//!    documents once more against the real domain names
//!
//! This is the only layer that catches task errors: it records them in the
//! [`RunSummary`], cleans up test domains and returns the error.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::path::PathBuf;

use asyncport_catalog::Catalog;
use asyncport_core::{AsyncApiDocument, CoreError, Direction, ImportSettings};

use crate::context::{Frame, RunContext, RunMode};
use crate::error::{EngineError, Result};
use crate::kinds::{
    ApplicationSettings, ApplicationVersionSettings, DomainSettings, EnumSettings,
    EnumVersionSettings, EventApiSettings, EventApiVersionSettings, EventSettings,
    EventVersionSettings, SchemaSettings, SchemaVersionSettings, address_levels,
    application_task, application_version_task, delete_domain_by_name, domain_task, enum_task,
    enum_version_task, event_api_task, event_api_version_task, event_task, event_version_task,
    schema_task, schema_version_task,
};
use crate::summary::{EntryKind, RunSummary};
use crate::task::{Action, ActionDetails, Reconcile, TaskConfig, TaskOutput, execute};
use crate::versioned::{
    ConflictPolicy, VersionContent, VersionPolicy, VersionedTask, execute_versioned,
};

/// A loaded document and the domain it is imported into
struct Target<'a> {
    document: &'a AsyncApiDocument,
    label: String,
    domain_name: String,
}

/// One pass over every document
#[derive(Debug, Clone, Copy)]
struct Pass {
    mode: RunMode,
    config: TaskConfig,
    conflict: ConflictPolicy,
    /// Every task must report `NOTHING_TO_DO`
    verify: bool,
    /// Import into test-prefixed domains
    prefixed: bool,
}

/// Event versions referenced by the operations of one document
#[derive(Debug, Default)]
struct EventRefs {
    produced: Vec<String>,
    consumed: Vec<String>,
}

/// Imports AsyncAPI documents into an event catalog
pub struct Importer {
    catalog: Catalog,
    settings: ImportSettings,
    summary: RunSummary,
}

impl Importer {
    pub fn new(catalog: Catalog, settings: ImportSettings) -> Self {
        Self {
            catalog,
            settings,
            summary: RunSummary::new(),
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Audit trail of every run executed by this importer
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Load the given files and import them
    pub async fn run(
        &mut self,
        mode: RunMode,
        files: &[PathBuf],
        domain_override: Option<&str>,
    ) -> Result<()> {
        let root = RunContext::new().child(Frame::RunMode(mode));

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let ctx = root.child(Frame::ApiFile(path.display().to_string()));
            match AsyncApiDocument::load(path) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    let err = EngineError::from(e).in_context(&ctx);
                    self.summary.record_error(mode, &err, &root);
                    return Err(err);
                }
            }
        }

        self.run_documents(mode, &documents, domain_override).await
    }

    /// Import already loaded documents
    pub async fn run_documents(
        &mut self,
        mode: RunMode,
        documents: &[AsyncApiDocument],
        domain_override: Option<&str>,
    ) -> Result<()> {
        let root = RunContext::new().child(Frame::RunMode(mode));
        self.summary.record(mode, false, EntryKind::RunStarted, &root);

        let targets = match resolve_targets(documents, domain_override) {
            Ok(targets) => targets,
            Err(e) => {
                let err = e.in_context(&root);
                self.summary.record_error(mode, &err, &root);
                return Err(err);
            }
        };

        tracing::info!(context = %root, documents = targets.len(), "import started");

        match mode {
            RunMode::TestMode | RunMode::TestModeKeep => {
                self.test_sequence(mode, &targets, &root).await
            }
            RunMode::ReleaseMode => {
                let test_ctx = root.child(Frame::RunMode(RunMode::TestMode));
                self.summary
                    .record(RunMode::TestMode, false, EntryKind::RunStarted, &test_ctx);
                self.test_sequence(RunMode::TestMode, &targets, &test_ctx)
                    .await?;
                self.release_pass(&targets, &root).await
            }
        }
    }

    /// Delete, apply, verify, and for `TestMode` delete again
    async fn test_sequence(
        &mut self,
        mode: RunMode,
        targets: &[Target<'_>],
        ctx: &RunContext,
    ) -> Result<()> {
        let domains: IndexSet<String> = targets
            .iter()
            .map(|t| {
                self.settings
                    .merged(t.document.settings_override())
                    .test_domain_name(&t.domain_name)
            })
            .collect();

        self.delete_domains(&domains, ctx).await;

        let result = self.apply_and_verify(mode, targets, ctx).await;
        if let Err(e) = &result {
            self.summary.record_error(mode, e, ctx);
        }

        if mode == RunMode::TestMode {
            self.delete_domains(&domains, ctx).await;
        }
        result
    }

    async fn apply_and_verify(
        &mut self,
        mode: RunMode,
        targets: &[Target<'_>],
        ctx: &RunContext,
    ) -> Result<()> {
        let apply = Pass {
            mode,
            config: TaskConfig::new(false),
            conflict: ConflictPolicy::Fail,
            verify: false,
            prefixed: true,
        };
        tracing::info!(context = %ctx, "apply pass");
        for target in targets {
            self.import_document(target, &apply, ctx).await?;
        }

        let verify = Pass {
            config: TaskConfig::new(true),
            verify: true,
            ..apply
        };
        tracing::info!(context = %ctx, "verify pass");
        for target in targets {
            self.import_document(target, &verify, ctx).await?;
        }
        Ok(())
    }

    async fn release_pass(&mut self, targets: &[Target<'_>], ctx: &RunContext) -> Result<()> {
        let pass = Pass {
            mode: RunMode::ReleaseMode,
            config: TaskConfig::new(false),
            conflict: ConflictPolicy::BumpPatchWithWarning,
            verify: false,
            prefixed: false,
        };
        tracing::info!(context = %ctx, "release pass");
        for target in targets {
            if let Err(e) = self.import_document(target, &pass, ctx).await {
                self.summary.record_error(RunMode::ReleaseMode, &e, ctx);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Best effort; failures are logged and ignored
    async fn delete_domains(&self, names: &IndexSet<String>, ctx: &RunContext) {
        for name in names {
            if let Err(e) = delete_domain_by_name(&self.catalog, name).await {
                tracing::warn!(context = %ctx, domain = %name, error = %e, "could not delete test domain");
            }
        }
    }

    /// Reconcile the resource tree of one document
    async fn import_document(
        &mut self,
        target: &Target<'_>,
        pass: &Pass,
        ctx: &RunContext,
    ) -> Result<()> {
        let document = target.document;
        let ctx = ctx
            .child(Frame::ApiFile(target.label.clone()))
            .child(Frame::Document {
                title: document.title().to_string(),
                version: document.version().to_string(),
            });
        let settings = self.settings.merged(document.settings_override());
        let domain_name = if pass.prefixed {
            settings.test_domain_name(&target.domain_name)
        } else {
            target.domain_name.clone()
        };

        let mut task = domain_task(&self.catalog, &DomainSettings::new(domain_name));
        let domain = self.apply(&mut task, pass, &pass.config, &ctx).await?;
        let domain_id = require_id(domain.object.id.as_deref(), &domain.action.details, &ctx)?;
        let config = pass.config.child(domain.transaction_id);

        let enum_versions = self
            .import_enums(document, &settings, &domain_id, pass, &config, &ctx)
            .await?;
        let events = self
            .import_events(
                document,
                &settings,
                &domain_id,
                &enum_versions,
                pass,
                &config,
                &ctx,
            )
            .await?;

        if settings.create_event_api {
            self.import_event_api(
                document, &settings, &domain_id, &events, pass, &config, &ctx,
            )
            .await?;
        }
        if settings.create_application {
            self.import_application(
                document, &settings, &domain_id, &events, pass, &config, &ctx,
            )
            .await?;
        }
        Ok(())
    }

    /// Enums for channel parameters with enumerated values, keyed by parameter name
    ///
    /// The catalog enum is named after the parameter, so the first channel that
    /// declares a parameter decides its values for the whole document.
    async fn import_enums(
        &mut self,
        document: &AsyncApiDocument,
        settings: &ImportSettings,
        domain_id: &str,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<HashMap<String, String>> {
        let mut enum_versions = HashMap::new();
        let mut declared: HashMap<&str, &[String]> = HashMap::new();

        for channel in document.channels() {
            let ctx = ctx.child(Frame::Channel {
                topic: channel.topic.clone(),
            });
            for parameter in &channel.parameters {
                let Some(values) = &parameter.enum_values else {
                    continue;
                };
                if let Some(first) = declared.get(parameter.name.as_str()) {
                    if *first != values.as_slice() {
                        tracing::debug!(
                            context = %ctx,
                            parameter = %parameter.name,
                            "enum values differ from an earlier channel, keeping the first list"
                        );
                    }
                    continue;
                }
                declared.insert(&parameter.name, values);
                let ctx = ctx.child(Frame::Parameter {
                    name: parameter.name.clone(),
                });

                let mut task = enum_task(
                    &self.catalog,
                    &EnumSettings {
                        name: parameter.name.clone(),
                        domain_id: domain_id.to_string(),
                        shared: settings.shared,
                    },
                );
                let topic_enum = self.apply(&mut task, pass, config, &ctx).await?;
                let enum_id =
                    require_id(topic_enum.object.id.as_deref(), &topic_enum.action.details, &ctx)?;

                let mut task = enum_version_task(
                    &self.catalog,
                    &EnumVersionSettings {
                        enum_id,
                        values: values.clone(),
                        display_name: Some(parameter.name.clone()),
                        description: parameter.description.clone(),
                        policy: bump_policy(document, settings),
                    },
                );
                let config = config.child(topic_enum.transaction_id);
                let version = self.apply_version(&mut task, pass, &config, &ctx).await?;
                let version_id =
                    require_id(version.object.id.as_deref(), &version.action.details, &ctx)?;
                enum_versions.insert(parameter.name.clone(), version_id);
            }
        }
        Ok(enum_versions)
    }

    /// Schemas and events for every operation's message
    #[allow(clippy::too_many_arguments)]
    async fn import_events(
        &mut self,
        document: &AsyncApiDocument,
        settings: &ImportSettings,
        domain_id: &str,
        enum_versions: &HashMap<String, String>,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<EventRefs> {
        let mut schema_versions: HashMap<String, String> = HashMap::new();
        let mut event_versions: HashMap<String, String> = HashMap::new();
        let mut refs = EventRefs::default();

        for channel in document.channels() {
            let channel_ctx = ctx.child(Frame::Channel {
                topic: channel.topic.clone(),
            });
            for operation in channel.operations() {
                let message = &operation.message;
                let ctx = channel_ctx
                    .child(Frame::Operation {
                        direction: operation.direction,
                    })
                    .child(Frame::Message {
                        name: message.name.clone(),
                    });

                let event_version_id = match event_versions.get(&message.event_name) {
                    Some(id) => id.clone(),
                    None => {
                        let schema_version_id = match schema_versions.get(&message.schema_name) {
                            Some(id) => id.clone(),
                            None => {
                                let id = self
                                    .import_schema(
                                        document, settings, domain_id, message, pass, config,
                                        &ctx,
                                    )
                                    .await?;
                                schema_versions.insert(message.schema_name.clone(), id.clone());
                                id
                            }
                        };

                        let mut task = event_task(
                            &self.catalog,
                            &EventSettings {
                                name: message.event_name.clone(),
                                domain_id: domain_id.to_string(),
                                shared: settings.shared,
                                broker_type: settings.broker_type.clone(),
                            },
                        );
                        let event = self.apply(&mut task, pass, config, &ctx).await?;
                        let event_id =
                            require_id(event.object.id.as_deref(), &event.action.details, &ctx)?;

                        let levels = address_levels(&channel.address_levels(), |name| {
                            enum_versions.get(name).cloned()
                        });
                        let mut task = event_version_task(
                            &self.catalog,
                            &EventVersionSettings {
                                event_id,
                                schema_version_id: Some(schema_version_id),
                                broker_type: settings.broker_type.clone(),
                                address_levels: levels,
                                display_name: Some(message.event_name.clone()),
                                description: message.description.clone(),
                                policy: bump_policy(document, settings).tracking_requested_version(),
                            },
                        );
                        let config = config.child(event.transaction_id);
                        let version = self.apply_version(&mut task, pass, &config, &ctx).await?;
                        let id =
                            require_id(version.object.id.as_deref(), &version.action.details, &ctx)?;
                        event_versions.insert(message.event_name.clone(), id.clone());
                        id
                    }
                };

                match operation.direction {
                    Direction::Subscribe => refs.produced.push(event_version_id),
                    Direction::Publish => refs.consumed.push(event_version_id),
                }
            }
        }

        for ids in [&mut refs.produced, &mut refs.consumed] {
            ids.sort();
            ids.dedup();
        }
        Ok(refs)
    }

    #[allow(clippy::too_many_arguments)]
    async fn import_schema(
        &mut self,
        document: &AsyncApiDocument,
        settings: &ImportSettings,
        domain_id: &str,
        message: &asyncport_core::Message,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<String> {
        let mut task = schema_task(
            &self.catalog,
            &SchemaSettings {
                name: message.schema_name.clone(),
                domain_id: domain_id.to_string(),
                shared: settings.shared,
                content_type: message.content_type.clone(),
            },
        );
        let schema = self.apply(&mut task, pass, config, ctx).await?;
        let schema_id = require_id(schema.object.id.as_deref(), &schema.action.details, ctx)?;

        let mut task = schema_version_task(
            &self.catalog,
            &SchemaVersionSettings {
                schema_id,
                payload: message.payload.clone(),
                display_name: None,
                description: None,
                policy: bump_policy(document, settings),
            },
        );
        let config = config.child(schema.transaction_id);
        let version = self.apply_version(&mut task, pass, &config, ctx).await?;
        require_id(version.object.id.as_deref(), &version.action.details, ctx)
    }

    #[allow(clippy::too_many_arguments)]
    async fn import_event_api(
        &mut self,
        document: &AsyncApiDocument,
        settings: &ImportSettings,
        domain_id: &str,
        events: &EventRefs,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<()> {
        let mut task = event_api_task(
            &self.catalog,
            &EventApiSettings {
                name: document.title().to_string(),
                domain_id: domain_id.to_string(),
                shared: settings.shared,
                broker_type: settings.broker_type.clone(),
            },
        );
        let event_api = self.apply(&mut task, pass, config, ctx).await?;
        let event_api_id =
            require_id(event_api.object.id.as_deref(), &event_api.action.details, ctx)?;

        let mut task = event_api_version_task(
            &self.catalog,
            &EventApiVersionSettings {
                event_api_id,
                produced_event_version_ids: events.produced.clone(),
                consumed_event_version_ids: events.consumed.clone(),
                display_name: Some(document.title().to_string()),
                description: document.description().map(String::from),
                policy: VersionPolicy::exact(document.version(), settings.target_state),
            },
        );
        let config = config.child(event_api.transaction_id);
        self.apply_version(&mut task, pass, &config, ctx).await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn import_application(
        &mut self,
        document: &AsyncApiDocument,
        settings: &ImportSettings,
        domain_id: &str,
        events: &EventRefs,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<()> {
        let mut task = application_task(
            &self.catalog,
            &ApplicationSettings {
                name: document.title().to_string(),
                domain_id: domain_id.to_string(),
                broker_type: settings.broker_type.clone(),
            },
        );
        let application = self.apply(&mut task, pass, config, ctx).await?;
        let application_id =
            require_id(application.object.id.as_deref(), &application.action.details, ctx)?;

        let mut task = application_version_task(
            &self.catalog,
            &ApplicationVersionSettings {
                application_id,
                produced_event_version_ids: events.produced.clone(),
                consumed_event_version_ids: events.consumed.clone(),
                display_name: Some(document.title().to_string()),
                description: document.description().map(String::from),
                policy: VersionPolicy::exact(document.version(), settings.target_state),
            },
        );
        let config = config.child(application.transaction_id);
        self.apply_version(&mut task, pass, &config, ctx).await?;
        Ok(())
    }

    async fn apply<T: Reconcile>(
        &mut self,
        task: &mut T,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<TaskOutput<T::Object>> {
        let output = execute(task, config, ctx)
            .await
            .map_err(|e| e.in_context(ctx))?;
        self.finish(output, pass, ctx)
    }

    async fn apply_version<V: VersionContent>(
        &mut self,
        task: &mut VersionedTask<V>,
        pass: &Pass,
        config: &TaskConfig,
        ctx: &RunContext,
    ) -> Result<TaskOutput<V>> {
        let output = execute_versioned(task, config, pass.conflict, ctx)
            .await
            .map_err(|e| e.in_context(ctx))?;
        self.finish(output, pass, ctx)
    }

    fn finish<T>(
        &mut self,
        output: TaskOutput<T>,
        pass: &Pass,
        ctx: &RunContext,
    ) -> Result<TaskOutput<T>> {
        self.summary.record_output(pass.mode, &output, ctx);

        if pass.verify && output.action() != Action::NothingToDo {
            let details = &output.action.details;
            return Err(EngineError::inconsistency(format!(
                "{} {} reported {} during verification",
                details.kind,
                details.keys,
                output.action()
            ))
            .in_context(ctx));
        }
        Ok(output)
    }
}

/// Pair every document with its domain name before anything is written
fn resolve_targets<'a>(
    documents: &'a [AsyncApiDocument],
    domain_override: Option<&str>,
) -> Result<Vec<Target<'a>>> {
    documents
        .iter()
        .map(|document| -> Result<Target<'a>> {
            let domain_name = domain_override
                .or_else(|| document.domain_name())
                .ok_or_else(|| CoreError::MissingField {
                    field: format!(
                        "info.x-ep-application-domain-name in '{}' (or a domain override)",
                        document.title()
                    ),
                })?;
            let label = document
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("<{}>", document.title()));
            Ok(Target {
                document,
                label,
                domain_name: domain_name.to_string(),
            })
        })
        .collect()
}

fn bump_policy(document: &AsyncApiDocument, settings: &ImportSettings) -> VersionPolicy {
    VersionPolicy::bump(
        Some(document.version().to_string()),
        settings.version_strategy,
        settings.target_state,
    )
}

fn require_id(id: Option<&str>, details: &ActionDetails, ctx: &RunContext) -> Result<String> {
    id.map(String::from).ok_or_else(|| {
        EngineError::content(details.kind, details.keys.clone(), "resource has no id")
            .in_context(ctx)
    })
}
