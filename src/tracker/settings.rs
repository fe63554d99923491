use crate::store::{entities::UserSettings, StateStore};

/// A partial settings change. Unset fields keep their current value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsUpdate {
    pub birth_year: Option<i32>,
    pub life_expectancy: Option<i32>,
}

/// Shallow merge, then the whole slot is overwritten.
pub async fn update_settings<S: StateStore>(store: &S, update: SettingsUpdate) -> UserSettings {
    let mut settings = store.settings().await;
    if let Some(birth_year) = update.birth_year {
        settings.birth_year = birth_year;
    }
    if let Some(life_expectancy) = update.life_expectancy {
        settings.life_expectancy = life_expectancy;
    }
    store.put_settings(settings).await;
    settings
}
