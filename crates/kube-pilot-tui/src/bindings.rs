//! fzf key bindings and command line
//!
//! Every binding runs `kube-pilot dispatch ...` for the selected row and then
//! reloads the list through `kube-pilot display`.

/// How fzf runs the dispatch command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    /// No terminal needed
    Silent,
    /// Takes over the terminal (prompts, shells, editors)
    Interactive,
    /// Output is piped into a pager
    Paged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub key: &'static str,
    /// `dispatch` arguments; `{1}`/`{2}` are fzf field placeholders
    pub args: &'static str,
    pub kind: BindKind,
    pub help: &'static str,
}

pub const BINDINGS: &[Binding] = &[
    Binding { key: "enter", args: "enter {1}", kind: BindKind::Silent, help: "open" },
    Binding { key: "esc", args: "back", kind: BindKind::Silent, help: "back" },
    Binding { key: "ctrl-o", args: "switch-contexts", kind: BindKind::Silent, help: "contexts" },
    Binding { key: "ctrl-t", args: "browse-resources", kind: BindKind::Silent, help: "resources" },
    Binding { key: "ctrl-d", args: "describe {1}", kind: BindKind::Paged, help: "describe" },
    Binding { key: "ctrl-x", args: "exec {1} {2}", kind: BindKind::Interactive, help: "shell" },
    Binding { key: "ctrl-l", args: "logs {1} {2}", kind: BindKind::Paged, help: "logs" },
    Binding { key: "alt-l", args: "logs --previous {1} {2}", kind: BindKind::Paged, help: "previous logs" },
    Binding { key: "ctrl-f", args: "logs --follow {1} {2}", kind: BindKind::Interactive, help: "follow logs" },
    Binding { key: "ctrl-k", args: "delete {1}", kind: BindKind::Interactive, help: "delete" },
    Binding { key: "alt-k", args: "delete --force {1}", kind: BindKind::Interactive, help: "force delete" },
    Binding { key: "ctrl-s", args: "scale {1}", kind: BindKind::Interactive, help: "scale" },
    Binding { key: "ctrl-e", args: "edit-yaml {1}", kind: BindKind::Interactive, help: "edit" },
    Binding { key: "ctrl-r", args: "refresh", kind: BindKind::Silent, help: "refresh" },
];

/// Quote a string for `sh -c`
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// Command fzf runs to render the current view
pub fn display_command(exe: &str) -> String {
    format!("{} display", shell_quote(exe))
}

impl Binding {
    /// The `--bind` value for this key
    pub fn to_bind(&self, exe: &str) -> String {
        let dispatch = format!("{} dispatch {}", shell_quote(exe), self.args);
        let run = match self.kind {
            BindKind::Silent => format!("execute-silent({})", dispatch),
            BindKind::Interactive => format!("execute({})", dispatch),
            BindKind::Paged => format!("execute({} | ${{PAGER:-less -R}})", dispatch),
        };
        format!("{}:{}+reload({})", self.key, run, display_command(exe))
    }
}

/// Key legend shown above the list
pub fn help_line() -> String {
    BINDINGS
        .iter()
        .map(|b| format!("{}: {}", b.key, b.help))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Full fzf argument list
pub fn fzf_args(exe: &str, listen: &str) -> Vec<String> {
    let mut args = vec![
        "--ansi".to_string(),
        "--no-sort".to_string(),
        "--layout=reverse".to_string(),
        "--header-lines=2".to_string(),
        format!("--header={}", help_line()),
        "--prompt=kube-pilot> ".to_string(),
        format!("--listen={}", listen),
    ];
    for binding in BINDINGS {
        args.push(format!("--bind={}", binding.to_bind(exe)));
    }
    args
}
