use crate::dashboard::View;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(warehouse: Option<String>, view: Option<String>, currency: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let changed = warehouse.is_some() || view.is_some() || currency.is_some();

    if let Some(w) = warehouse {
        settings.warehouse_path = shellexpand_path(&w);
    }
    if let Some(v) = view {
        settings.default_view = v.parse::<View>()?.to_string();
    }
    if let Some(c) = currency {
        settings.currency_symbol = c;
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("warehouse_path:  {}", settings.warehouse_path);
    println!("default_view:    {}", settings.default_view);
    println!("currency_symbol: {}", settings.currency_symbol);
    Ok(())
}
