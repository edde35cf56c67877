pub mod golang;
pub mod logging;
pub mod nodejs;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod security;

use crate::Result;
use serde_json::Value;

pub use logging::DebugAdapterLogger;

/// The four language tags spec §3 recognizes on session creation. `Ruby`
/// is carried in the tree (`adapters::ruby`) as a teacher-idiom reference
/// but intentionally left out of this enum — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Go,
    Native,
}

impl Language {
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "py" | "python" => Ok(Self::Python),
            "js" | "javascript" | "node" | "typescript" | "ts" => Ok(Self::JavaScript),
            "go" | "golang" => Ok(Self::Go),
            "rust" | "native" | "c" | "cpp" | "c++" => Ok(Self::Native),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown language tag {other:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::JavaScript => "js",
            Self::Go => "go",
            Self::Native => "native",
        }
    }
}

/// Everything a `DebugSession` needs from a language's adapter to launch
/// it and build its `launch`/`attach` DAP arguments, factored out so
/// session code stops matching on language (spec §4.4). Each adapter
/// keeps its existing spawn/transport machinery (STDIO vs TCP varies per
/// language); this trait only unifies the pieces session.rs consumes.
pub trait AdapterProfile: Send + Sync {
    /// DAP `adapterID` sent in the `initialize` request.
    fn adapter_id(&self) -> &'static str;

    /// Build `launch` request arguments for a program path + args.
    fn launch_args(&self, program: &str, args: &[String], cwd: Option<&str>, stop_on_entry: bool) -> Value;
}

pub struct PythonProfile;
impl AdapterProfile for PythonProfile {
    fn adapter_id(&self) -> &'static str {
        python::PythonAdapter::adapter_id()
    }

    fn launch_args(&self, program: &str, args: &[String], cwd: Option<&str>, stop_on_entry: bool) -> Value {
        let mut launch = python::PythonAdapter::launch_args(program, args, cwd);
        launch["stopOnEntry"] = Value::Bool(stop_on_entry);
        launch
    }
}

pub struct NodeJsProfile;
impl AdapterProfile for NodeJsProfile {
    fn adapter_id(&self) -> &'static str {
        nodejs::NodeJsAdapter::adapter_id()
    }

    fn launch_args(&self, program: &str, args: &[String], cwd: Option<&str>, stop_on_entry: bool) -> Value {
        nodejs::NodeJsAdapter::launch_config(program, args, cwd, stop_on_entry)
    }
}

pub struct GoProfile;
impl AdapterProfile for GoProfile {
    fn adapter_id(&self) -> &'static str {
        golang::GoAdapter::adapter_id()
    }

    fn launch_args(&self, program: &str, args: &[String], cwd: Option<&str>, stop_on_entry: bool) -> Value {
        golang::GoAdapter::launch_args_with_options(program, args, cwd, stop_on_entry)
    }
}

pub struct NativeProfile;
impl AdapterProfile for NativeProfile {
    fn adapter_id(&self) -> &'static str {
        "codelldb"
    }

    fn launch_args(&self, program: &str, args: &[String], cwd: Option<&str>, stop_on_entry: bool) -> Value {
        rust::RustAdapter::launch_args(program, args, cwd, stop_on_entry)
    }
}

pub fn profile_for(language: Language) -> Box<dyn AdapterProfile> {
    match language {
        Language::Python => Box::new(PythonProfile),
        Language::JavaScript => Box::new(NodeJsProfile),
        Language::Go => Box::new(GoProfile),
        Language::Native => Box::new(NativeProfile),
    }
}
