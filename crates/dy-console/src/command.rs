/// One console command, parsed from a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Folders,
    CreateFolder(String),
    DeleteFolder(String),
    OpenFolder(String),
    ListFiles(String),
    ReadFile {
        folder: String,
        file: String,
    },
    WriteFile {
        folder: String,
        file: String,
        content: String,
    },
    DeleteFile {
        folder: String,
        file: String,
    },
    Deploy {
        folder: String,
        url_path: String,
    },
    Undeploy(String),
    Apps {
        json: bool,
    },
    Ports,
    Quit,
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

fn words<const N: usize>(verb: &str, rest: &str, usage: &str) -> Result<[String; N], String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != N {
        return Err(format!("usage: {verb} {usage}"));
    }
    Ok(std::array::from_fn(|i| parts[i].to_string()))
}

/// Expand `\n`, `\t` and `\\` in file content typed on one line.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse one line. Blank lines and lines starting with `#` yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.starts_with('#') {
        return Ok(None);
    }
    let Some((verb, rest)) = next_word(line) else {
        return Ok(None);
    };

    let command = match verb {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "folders" => Command::Folders,
        "ports" => Command::Ports,
        "mkdir" => {
            let [name] = words::<1>(verb, rest, "<folder>")?;
            Command::CreateFolder(name)
        }
        "rmdir" => {
            let [name] = words::<1>(verb, rest, "<folder>")?;
            Command::DeleteFolder(name)
        }
        "open" => {
            let [name] = words::<1>(verb, rest, "<folder>")?;
            Command::OpenFolder(name)
        }
        "ls" => {
            let [name] = words::<1>(verb, rest, "<folder>")?;
            Command::ListFiles(name)
        }
        "cat" => {
            let [folder, file] = words::<2>(verb, rest, "<folder> <file>")?;
            Command::ReadFile { folder, file }
        }
        "rm" => {
            let [folder, file] = words::<2>(verb, rest, "<folder> <file>")?;
            Command::DeleteFile { folder, file }
        }
        "write" => {
            let usage = || "usage: write <folder> <file> [content]".to_string();
            let (folder, rest) = next_word(rest).ok_or_else(usage)?;
            let (file, rest) = next_word(rest).ok_or_else(usage)?;
            // Content keeps its inner spacing; one separating space is dropped.
            let content = rest.strip_prefix(' ').unwrap_or(rest);
            Command::WriteFile {
                folder: folder.to_string(),
                file: file.to_string(),
                content: unescape(content),
            }
        }
        "deploy" => {
            let [folder, url_path] = words::<2>(verb, rest, "<folder> <url-path>")?;
            Command::Deploy { folder, url_path }
        }
        "undeploy" => {
            let [folder] = words::<1>(verb, rest, "<folder>")?;
            Command::Undeploy(folder)
        }
        "apps" => match rest.trim() {
            "" => Command::Apps { json: false },
            "--json" => Command::Apps { json: true },
            _ => return Err("usage: apps [--json]".into()),
        },
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}
