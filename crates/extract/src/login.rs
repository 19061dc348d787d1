use serde_json::Value as Json;

/// Observables extracted from a login/auth alert payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginObservables {
    pub users: Vec<String>,
    pub ips: Vec<String>,
    pub user_agents: Vec<String>,
    pub countries: Vec<String>,
    pub cities: Vec<String>,
}

fn str_field(payload: &Json, key: &str) -> String {
    payload
        .get(key)
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Extract user, ip, user-agent, country, and city as singleton lists (empty
/// when the corresponding field is absent or blank after trimming).
#[must_use]
pub fn extract_login(payload: &Json) -> LoginObservables {
    let user = str_field(payload, "user").trim().to_lowercase();
    let ip = str_field(payload, "ip").trim().to_string();
    let user_agent = str_field(payload, "user_agent").trim().to_string();
    let country = str_field(payload, "country").trim().to_string();
    let city = str_field(payload, "city").trim().to_string();

    let mut out = LoginObservables::default();
    if !user.is_empty() {
        out.users.push(user);
    }
    if !ip.is_empty() {
        out.ips.push(ip);
    }
    if !user_agent.is_empty() {
        out.user_agents.push(user_agent);
    }
    if !country.is_empty() {
        out.countries.push(country);
    }
    if !city.is_empty() {
        out.cities.push(city);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_lowercases_user() {
        let payload = serde_json::json!({
            "user": "Neil@Company.com",
            "ip": " 10.0.0.1 ",
            "user_agent": "curl/8.0",
            "country": "US",
            "city": "Chicago",
        });
        let out = extract_login(&payload);
        assert_eq!(out.users, vec!["neil@company.com"]);
        assert_eq!(out.ips, vec!["10.0.0.1"]);
        assert_eq!(out.countries, vec!["US"]);
        assert_eq!(out.cities, vec!["Chicago"]);
    }

    #[test]
    fn absent_fields_yield_empty_lists() {
        let out = extract_login(&serde_json::json!({}));
        assert!(out.users.is_empty());
        assert!(out.ips.is_empty());
        assert!(out.user_agents.is_empty());
        assert!(out.countries.is_empty());
        assert!(out.cities.is_empty());
    }
}
