//! Built-in language table and lookup.

use crate::errors::SandboxError;
use crate::languages::{ExecutionFamily, LanguageProfile, WrapTemplate};

/// Wrap a bare Java statement sequence in the entry-point class the JVM
/// toolchain requires. The file is always staged as `Main.java`, so the
/// class name and file name stay matched.
fn wrap_java_snippet(code: &str) -> String {
    let mut body = String::new();
    for line in code.lines() {
        body.push_str("        ");
        body.push_str(line);
        body.push('\n');
    }
    format!(
        "public class Main {{\n    public static void main(String[] args) throws Exception {{\n{body}    }}\n}}\n"
    )
}

const JAVA_WRAP: WrapTemplate = WrapTemplate {
    marker: "class ",
    apply: wrap_java_snippet,
};

/// The built-in profile table. Images for the script languages follow the
/// pinned-slim convention; the C/C++ and Java images match the toolchain
/// images the product ships.
const BUILTIN_PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        id: "py",
        aliases: &["python", "python3"],
        extension: "py",
        image: "python:3.10-slim",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["python3", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "js",
        aliases: &["javascript", "node", "nodejs"],
        extension: "js",
        image: "node:18-slim",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["node", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "rb",
        aliases: &["ruby"],
        extension: "rb",
        image: "ruby:3.3-slim",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["ruby", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "php",
        aliases: &[],
        extension: "php",
        image: "php:8.2-cli",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["php", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "pl",
        aliases: &["perl"],
        extension: "pl",
        image: "perl:5.38-slim",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["perl", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "r",
        aliases: &["rscript"],
        extension: "r",
        image: "r-base:4.3.2",
        source_file_name: None,
        family: ExecutionFamily::Interpreted {
            run: &["Rscript", "{src}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "c",
        aliases: &[],
        extension: "c",
        image: "gcc:latest",
        source_file_name: None,
        family: ExecutionFamily::Compiled {
            compile: &["gcc", "{src}", "-O2", "-o", "{bin}"],
            run: &["./{bin}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "cpp",
        aliases: &["c++", "cxx"],
        extension: "cpp",
        image: "gcc:latest",
        source_file_name: None,
        family: ExecutionFamily::Compiled {
            compile: &["g++", "{src}", "-O2", "-o", "{bin}"],
            run: &["./{bin}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "go",
        aliases: &["golang"],
        extension: "go",
        image: "golang:1.22-alpine",
        source_file_name: None,
        family: ExecutionFamily::Compiled {
            compile: &["go", "build", "-o", "{bin}", "{src}"],
            run: &["./{bin}"],
        },
        wrap: None,
        // The Go toolchain refuses to run without writable cache dirs when
        // HOME is unset inside the container.
        env: &[
            ("GOCACHE", "/tmp/gocache"),
            ("GOPATH", "/tmp/gopath"),
            ("HOME", "/tmp"),
        ],
    },
    LanguageProfile {
        id: "rs",
        aliases: &["rust"],
        extension: "rs",
        image: "rust:1.75-slim",
        source_file_name: None,
        family: ExecutionFamily::Compiled {
            compile: &["rustc", "{src}", "-O", "-o", "{bin}"],
            run: &["./{bin}"],
        },
        wrap: None,
        env: &[],
    },
    LanguageProfile {
        id: "java",
        aliases: &[],
        extension: "java",
        image: "openjdk:17-slim",
        source_file_name: Some("Main.java"),
        family: ExecutionFamily::FixedEntryPoint {
            compile: &["javac", "{src}"],
            run: &["java", "-cp", ".", "Main"],
        },
        wrap: Some(JAVA_WRAP),
        env: &[],
    },
];

/// Read-only mapping from language identifiers to profiles. Built once at
/// startup; safe for unsynchronized concurrent reads.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    profiles: Vec<LanguageProfile>,
}

impl LanguageRegistry {
    /// The registry with all built-in languages.
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES.to_vec(),
        }
    }

    /// A registry over an explicit profile set. Used by embedders and tests
    /// that want a reduced or augmented language table.
    pub fn new(profiles: Vec<LanguageProfile>) -> Self {
        Self { profiles }
    }

    /// Pure lookup, no side effects. Unknown identifiers surface as a client
    /// error before any workspace is created.
    pub fn resolve(&self, language: &str) -> Result<&LanguageProfile, SandboxError> {
        self.profiles
            .iter()
            .find(|p| p.matches(language))
            .ok_or_else(|| SandboxError::UnsupportedLanguage(language.to_string()))
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_ids() {
        let registry = LanguageRegistry::builtin();
        for id in ["py", "js", "rb", "php", "pl", "r", "c", "cpp", "go", "rs", "java"] {
            assert!(registry.resolve(id).is_ok(), "missing profile for {id}");
        }
    }

    #[test]
    fn resolves_aliases_case_insensitively() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.resolve("Python3").unwrap().id, "py");
        assert_eq!(registry.resolve("NODE").unwrap().id, "js");
        assert_eq!(registry.resolve("golang").unwrap().id, "go");
        assert_eq!(registry.resolve("rust").unwrap().id, "rs");
    }

    #[test]
    fn unknown_language_is_a_client_error() {
        let registry = LanguageRegistry::builtin();
        let err = registry.resolve("cobol").unwrap_err();
        assert!(err.is_client_error());
        assert!(matches!(err, SandboxError::UnsupportedLanguage(l) if l == "cobol"));
    }

    #[test]
    fn profile_ids_are_unique_across_aliases() {
        let registry = LanguageRegistry::builtin();
        for profile in registry.profiles() {
            let hits = registry
                .profiles()
                .iter()
                .filter(|p| p.matches(profile.id))
                .count();
            assert_eq!(hits, 1, "ambiguous id {}", profile.id);
        }
    }

    #[test]
    fn fixed_entry_point_profile_has_matching_source_name() {
        let registry = LanguageRegistry::builtin();
        let java = registry.resolve("java").unwrap();
        assert_eq!(java.source_name(), "Main.java");
        assert!(matches!(java.family, ExecutionFamily::FixedEntryPoint { .. }));
    }

    #[test]
    fn java_wrap_applies_only_to_bare_snippets() {
        let registry = LanguageRegistry::builtin();
        let java = registry.resolve("java").unwrap();
        let wrap = java.wrap.expect("java profile carries a wrap template");

        let wrapped = wrap
            .wrap_if_bare("System.out.println(\"hi\");")
            .expect("bare statement should be wrapped");
        assert!(wrapped.contains("public class Main"));
        assert!(wrapped.contains("System.out.println(\"hi\");"));

        let full = "public class Main { public static void main(String[] a) {} }";
        assert!(wrap.wrap_if_bare(full).is_none());
    }

    #[test]
    fn compiled_profiles_produce_an_artifact_step() {
        let registry = LanguageRegistry::builtin();
        for id in ["c", "cpp", "go", "rs", "java"] {
            let profile = registry.resolve(id).unwrap();
            assert!(
                profile.family.compile_template().is_some(),
                "{id} should have a compile stage"
            );
        }
        for id in ["py", "js", "rb", "php", "pl", "r"] {
            let profile = registry.resolve(id).unwrap();
            assert!(profile.family.compile_template().is_none());
        }
    }
}
