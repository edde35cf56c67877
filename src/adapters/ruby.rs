use serde_json::{json, Value};

/// Ruby rdbg (debug gem) adapter configuration
pub struct RubyAdapter;

impl RubyAdapter {
    pub fn command() -> String {
        "rdbg".to_string()
    }

    pub fn args_with_options(program: &str, program_args: &[String], stop_on_entry: bool) -> Vec<String> {
        // rdbg runs the program directly via stdio (unlike debugpy which is just an adapter server)
        // Command format: rdbg [options] program.rb [program args]
        let mut args = vec![];

        // Add --nonstop flag if we DON'T want to stop on entry
        // Default rdbg behavior is to stop at program start with --stop-at-load
        if stop_on_entry {
            args.push("--stop-at-load".to_string());
        } else {
            args.push("--nonstop".to_string());
        }

        // Add program path
        args.push(program.to_string());

        // Add program arguments
        args.extend(program_args.iter().cloned());

        args
    }

    pub fn adapter_id() -> &'static str {
        "rdbg"
    }

    pub fn launch_args_with_options(
        program: &str,
        args: &[String],
        cwd: Option<&str>,
        stop_on_entry: bool,
    ) -> Value {
        let mut launch = json!({
            "request": "launch",
            "type": "ruby",
            "program": program,
            "args": args,
            "stopOnEntry": stop_on_entry,
            // Ruby debugger uses localfs for path mapping
            "localfs": true,
        });

        if let Some(cwd_path) = cwd {
            launch["cwd"] = json!(cwd_path);
        }

        launch
    }
}
