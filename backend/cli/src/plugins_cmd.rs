//! `mdforge plugins`: list registered plugins.

use crate::config::Settings;
use crate::terminal_output::{render_table, Column};

pub fn run(settings: &Settings) {
    print!("{}", plugin_table(settings));
}

fn plugin_table(settings: &Settings) -> String {
    let registry = settings.registry();
    let rows: Vec<Vec<String>> = registry
        .list()
        .into_iter()
        .map(|plugin| {
            let enabled = registry.get(plugin.id()).is_some_and(|p| p.enabled);
            vec![
                plugin.id().to_string(),
                plugin.manifest.version.clone(),
                if enabled { "yes".to_string() } else { "no".to_string() },
                (plugin.parse_rules.len() + plugin.serialize_rules.len()).to_string(),
                plugin.elements().join(", "),
            ]
        })
        .collect();
    let columns = [
        Column::left("Id"),
        Column::left("Version"),
        Column::left("Enabled"),
        Column::right("Rules"),
        Column::left("Elements"),
    ];
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_output::strip_ansi;
    use mdforge_config::{apply_all_defaults, MdforgeConfig};
    use std::path::PathBuf;

    #[test]
    fn lists_builtin_card_plugin() {
        let settings =
            Settings { path: PathBuf::from("config.yaml"), config: apply_all_defaults(MdforgeConfig::default()) };
        let table = strip_ansi(&plugin_table(&settings));
        let row = table.lines().nth(2).unwrap();
        assert!(row.trim_start().starts_with("card"));
        assert!(row.contains("yes"));
    }
}
