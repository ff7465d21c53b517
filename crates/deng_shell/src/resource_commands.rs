//! Resource inspection and cache commands

use deng_core::ResourceUri;
use deng_resource::{Manifest, ResourceCollection};

use crate::command::{Command, CommandError, CommandHandler, CommandResult};
use crate::context::ConsoleContext;
use crate::output::OutputLine;

fn parse_uri(text: &str) -> Result<ResourceUri, CommandError> {
    ResourceUri::parse(text).map_err(|err| CommandError::InvalidArguments(format!("'{}': {}", text, err)))
}

/// Manifests of a collection matching an optional scheme and path filter.
/// A single argument naming a known scheme is taken as the scheme.
fn select<'c, R>(
    collection: &'c ResourceCollection<R>,
    cmd: &Command,
) -> Result<(Option<String>, Vec<&'c Manifest<R>>), CommandError> {
    let (scheme, filter) = match (cmd.get_arg(0), cmd.get_arg(1)) {
        (Some(a), Some(b)) => (Some(a), Some(b)),
        (Some(a), None) if collection.is_known_scheme(a) => (Some(a), None),
        (Some(a), None) => (None, Some(a)),
        _ => (None, None),
    };

    let filter = filter.map(str::to_lowercase);
    let matches = |m: &&Manifest<R>| filter.as_deref().map_or(true, |f| m.path().key().contains(f));

    let manifests: Vec<&Manifest<R>> = match scheme {
        Some(name) => collection.scheme(name)?.iter().filter(matches).collect(),
        None => collection.iter().filter(matches).collect(),
    };
    let scheme = scheme.map(|s| collection.scheme(s).map(|s| s.name().to_string())).transpose()?;
    Ok((scheme, manifests))
}

/// List material manifests
pub struct ListMaterialsCommand;

impl CommandHandler for ListMaterialsCommand {
    fn name(&self) -> &str {
        "listmaterials"
    }

    fn description(&self) -> &str {
        "List materials, optionally by scheme and path filter"
    }

    fn usage(&self) -> &str {
        "listmaterials [scheme] [filter]"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 2, self.usage())?;
        let (scheme, manifests) = select(ctx.resources.materials(), cmd)?;

        let heading = match &scheme {
            Some(name) => format!("Known materials in scheme '{}':", name),
            None => "Known materials:".to_string(),
        };
        let lines = manifests.iter().enumerate().map(|(i, m)| {
            let variants = m.resource().map_or(0, |mat| mat.variants().len());
            OutputLine::info(format!(
                "{:4}: {:32} {:9} {} variant(s)",
                i,
                m.uri().to_string(),
                m.state().to_string(),
                variants
            ))
        });
        let uris: Vec<String> = manifests.iter().map(|m| m.uri().to_string()).collect();

        Ok(CommandResult::with_message(heading)
            .add_lines(lines)
            .add_line(OutputLine::info(format!("Found {} materials", uris.len())))
            .with_data(serde_json::json!(uris)))
    }
}

/// Describe one material
pub struct InspectMaterialCommand;

impl CommandHandler for InspectMaterialCommand {
    fn name(&self) -> &str {
        "inspectmaterial"
    }

    fn description(&self) -> &str {
        "Describe a material and its variants"
    }

    fn usage(&self) -> &str {
        "inspectmaterial <uri>"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(1, 1, self.usage())?;
        let uri = parse_uri(cmd.require_arg(0, "uri")?)?;
        let manifest = ctx.resources.material_manifest(&uri)?;

        let mut result = CommandResult::with_message(format!(
            "Material \"{}\" [id {}] {} ({})",
            manifest.uri(),
            manifest.id(),
            manifest.state(),
            manifest.origin()
        ));

        let Some(material) = manifest.resource() else {
            return Ok(result.add_line(OutputLine::warning("Not defined")));
        };

        let (w, h) = material.dimensions();
        result = result.add_line(OutputLine::info(format!(
            "Dimensions: {}x{} Layers: {} Flags: {:#x}",
            w,
            h,
            material.layer_count(),
            material.flags().bits()
        )));
        for (i, layer) in material.def().layers.iter().enumerate() {
            let state = ctx
                .resources
                .textures()
                .state_of(&layer.texture)
                .map(|s| s.to_string())
                .unwrap_or_else(|err| err.to_string());
            result = result.add_line(OutputLine::info(format!(
                "  layer #{}: {} ({}) tics:{}",
                i, layer.texture, state, layer.tics
            )));
        }

        result = result.add_line(OutputLine::info(format!(
            "Variants: {}",
            material.variants().len()
        )));
        for (i, variant) in material.variants().iter().enumerate() {
            result = result.add_line(OutputLine::info(format!(
                "  variant #{}: context:{} prepared:{} [{}]",
                i,
                variant.spec().context,
                if variant.is_prepared() { "yes" } else { "no" },
                variant.spec().primary
            )));
        }
        Ok(result)
    }
}

/// List texture manifests
pub struct ListTexturesCommand;

impl CommandHandler for ListTexturesCommand {
    fn name(&self) -> &str {
        "listtextures"
    }

    fn description(&self) -> &str {
        "List textures, optionally by scheme and path filter"
    }

    fn usage(&self) -> &str {
        "listtextures [scheme] [filter]"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 2, self.usage())?;
        let (scheme, manifests) = select(ctx.resources.textures(), cmd)?;

        let heading = match &scheme {
            Some(name) => format!("Known textures in scheme '{}':", name),
            None => "Known textures:".to_string(),
        };
        let lines = manifests.iter().enumerate().map(|(i, m)| {
            let size = m
                .resource()
                .map(|t| format!("{}x{}", t.def().width, t.def().height))
                .unwrap_or_else(|| "-".to_string());
            OutputLine::info(format!(
                "{:4}: {:32} {:9} {:>9} {}",
                i,
                m.uri().to_string(),
                m.state().to_string(),
                size,
                m.origin()
            ))
        });
        let count = manifests.len();

        Ok(CommandResult::with_message(heading)
            .add_lines(lines)
            .add_line(OutputLine::info(format!("Found {} textures", count))))
    }
}

/// Drop pending cache tasks
pub struct ClearCacheCommand;

impl CommandHandler for ClearCacheCommand {
    fn name(&self) -> &str {
        "clearcache"
    }

    fn description(&self) -> &str {
        "Discard pending cache (precache) tasks"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let purged = ctx.resources.purge_cache_queue()?;
        Ok(CommandResult::with_message(format!("Purged {} cache tasks", purged)))
    }
}

/// Process the cache queue now
pub struct PrecacheCommand;

impl CommandHandler for PrecacheCommand {
    fn name(&self) -> &str {
        "precache"
    }

    fn description(&self) -> &str {
        "Prepare every queued material variant"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let report = ctx.resources.process_cache_queue()?;
        let result = CommandResult::with_message(format!("Cache queue: {}", report)).with_data(
            serde_json::json!({
                "prepared": report.prepared,
                "failed": report.failed,
                "skipped": report.skipped,
            }),
        );
        if report.failed > 0 {
            return Ok(result.add_line(OutputLine::warning(format!(
                "{} tasks failed; see the log",
                report.failed
            ))));
        }
        Ok(result)
    }
}

/// Release every GPU texture
pub struct ReleaseGlCommand;

impl CommandHandler for ReleaseGlCommand {
    fn name(&self) -> &str {
        "releasegl"
    }

    fn description(&self) -> &str {
        "Release all GL textures; they reload on demand"
    }

    fn execute(&self, cmd: &Command, ctx: &mut ConsoleContext<'_>) -> Result<CommandResult, CommandError> {
        cmd.expect_args(0, 0, self.usage())?;
        let released = ctx.resources.release_all_gl()?;
        Ok(CommandResult::with_message(format!("Released {} GL textures", released)))
    }
}
