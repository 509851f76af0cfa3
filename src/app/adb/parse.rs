use crate::app::models::DeviceSummary;

pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let serial = tokens.next()?.to_string();
            let state = tokens.next()?.to_string();
            let mut summary = DeviceSummary {
                serial,
                state,
                model: None,
                product: None,
                device: None,
                transport_id: None,
            };
            for token in tokens {
                let Some((key, value)) = token.split_once(':') else {
                    continue;
                };
                let value = Some(value.to_string());
                match key {
                    "model" => summary.model = value,
                    "product" => summary.product = value,
                    "device" => summary.device = value,
                    "transport_id" => summary.transport_id = value,
                    _ => {}
                }
            }
            Some(summary)
        })
        .collect()
}

/// True when `pm list packages` output names `package` exactly.
pub fn parse_package_listed(output: &str, package: &str) -> bool {
    let package = package.trim();
    if package.is_empty() {
        return false;
    }
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .any(|name| name.trim() == package)
}
