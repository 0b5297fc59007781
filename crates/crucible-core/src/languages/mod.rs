//! Language profiles: the data that used to be per-language code.
//!
//! Every supported language is one [`LanguageProfile`] record. The execution
//! driver interprets the record; adding a language is a registry entry, never
//! a change to the driver. Command templates use two placeholders, `{src}`
//! (the staged source file) and `{bin}` (the compiled artifact), both
//! workspace-relative so the same plan works under the container strategy
//! (workdir `/sandbox`) and the subprocess strategy (workdir = scratch dir).

pub mod registry;

pub use registry::LanguageRegistry;

/// How a language's toolchain turns source into a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionFamily {
    /// Single run step: `interpreter <src>`.
    Interpreted { run: &'static [&'static str] },
    /// Compile to a native artifact, then execute it. The compile step
    /// short-circuits the run step on failure.
    Compiled {
        compile: &'static [&'static str],
        run: &'static [&'static str],
    },
    /// Compile step produces a bytecode artifact whose name must match the
    /// profile's entry symbol; the run step invokes the VM with that symbol.
    FixedEntryPoint {
        compile: &'static [&'static str],
        run: &'static [&'static str],
    },
}

impl ExecutionFamily {
    /// The command template for the compile stage, when the family has one.
    pub fn compile_template(&self) -> Option<&'static [&'static str]> {
        match self {
            ExecutionFamily::Interpreted { .. } => None,
            ExecutionFamily::Compiled { compile, .. }
            | ExecutionFamily::FixedEntryPoint { compile, .. } => Some(compile),
        }
    }

    pub fn run_template(&self) -> &'static [&'static str] {
        match self {
            ExecutionFamily::Interpreted { run }
            | ExecutionFamily::Compiled { run, .. }
            | ExecutionFamily::FixedEntryPoint { run, .. } => run,
        }
    }
}

/// Textual transform producing a complete program from a bare snippet, for
/// languages that require an enclosing entry point.
#[derive(Debug, Clone, Copy)]
pub struct WrapTemplate {
    /// If the snippet already contains this top-level construct it is treated
    /// as self-contained and written verbatim.
    pub marker: &'static str,
    pub apply: fn(&str) -> String,
}

impl WrapTemplate {
    /// Apply the template unless the snippet already looks self-contained.
    pub fn wrap_if_bare(&self, code: &str) -> Option<String> {
        if code.contains(self.marker) {
            None
        } else {
            Some((self.apply)(code))
        }
    }
}

/// Static configuration for one supported language. Loaded once at process
/// start, read-only thereafter.
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    /// Canonical short identifier, also the first accepted alias.
    pub id: &'static str,
    /// Additional identifiers accepted at the boundary.
    pub aliases: &'static [&'static str],
    pub extension: &'static str,
    /// Container image for the container strategy. Config may override this
    /// per language.
    pub image: &'static str,
    /// Fixed on-disk name when the toolchain requires a specific file/class
    /// match. `None` means `main.<extension>`.
    pub source_file_name: Option<&'static str>,
    pub family: ExecutionFamily,
    pub wrap: Option<WrapTemplate>,
    /// Extra environment for both stages (e.g. toolchain cache locations).
    pub env: &'static [(&'static str, &'static str)],
}

impl LanguageProfile {
    /// The on-disk source file name for this profile.
    pub fn source_name(&self) -> String {
        match self.source_file_name {
            Some(fixed) => fixed.to_string(),
            None => format!("main.{}", self.extension),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        let id = id.to_lowercase();
        self.id == id || self.aliases.iter().any(|a| *a == id)
    }
}
