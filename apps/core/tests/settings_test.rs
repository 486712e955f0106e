use lumina_core::config::Config;
use lumina_core::settings::SettingsPanel;

#[test]
fn opening_without_config_starts_from_defaults() {
    let mut panel = SettingsPanel::default();

    assert!(panel.open(None));
    assert_eq!(panel.draft(), Some(&Config::default()));
}

#[test]
fn closing_discards_unsaved_draft() {
    let mut panel = SettingsPanel::default();
    let current = Config::default();
    panel.open(Some(&current));
    panel.edit(Config {
        default_model: "openai/gpt-4o-mini".into(),
        ..current.clone()
    });

    panel.close();
    panel.open(Some(&current));

    assert_eq!(panel.draft(), Some(&current));
}
