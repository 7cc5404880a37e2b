//! Current-weather lookup via wttr.in.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use minerva_ai::{Tool, ToolContext, ToolDeclaration, ToolError};

const WTTR_BASE: &str = "https://wttr.in";

/// Looks up the current weather for a city using wttr.in's JSON format.
pub struct WeatherTool {
    http: reqwest::Client,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Condense wttr.in's `format=j1` payload to the fields the model
    /// actually needs.
    fn condense(city: &str, payload: &JsonValue) -> Result<JsonValue, ToolError> {
        let current = payload["current_condition"]
            .get(0)
            .ok_or_else(|| ToolError::InvalidResponse("missing current_condition".into()))?;

        let area = payload["nearest_area"][0]["areaName"][0]["value"]
            .as_str()
            .unwrap_or(city);

        Ok(json!({
            "city": area,
            "description": current["weatherDesc"][0]["value"].as_str().unwrap_or("unknown"),
            "temperature_c": current["temp_C"].as_str().unwrap_or(""),
            "feels_like_c": current["FeelsLikeC"].as_str().unwrap_or(""),
            "humidity_pct": current["humidity"].as_str().unwrap_or(""),
            "wind_kmph": current["windspeedKmph"].as_str().unwrap_or(""),
        }))
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "get_current_weather".to_string(),
            description: "Get the current weather conditions for a city.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name, e.g. 'Jakarta' or 'New York'"
                    }
                },
                "required": ["city"]
            }),
        }
    }

    async fn invoke(&self, args: &JsonValue, _ctx: &ToolContext<'_>) -> Result<JsonValue, ToolError> {
        let city = args["city"]
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing required argument 'city'".into()))?;

        debug!(%city, "Fetching weather");

        // wttr.in takes the location in the path; spaces become '+'.
        let url = format!("{}/{}", WTTR_BASE, city.trim().replace(' ', "+"));
        let response = self
            .http
            .get(&url)
            .query(&[("format", "j1")])
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Request(format!(
                "wttr.in returned HTTP {status}"
            )));
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;

        Self::condense(city, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_requires_city() {
        let decl = WeatherTool::new().declaration();
        assert_eq!(decl.name, "get_current_weather");
        assert_eq!(decl.parameters["required"][0], "city");
    }

    #[test]
    fn condense_extracts_current_condition() {
        let payload = json!({
            "current_condition": [{
                "temp_C": "31",
                "FeelsLikeC": "35",
                "humidity": "70",
                "windspeedKmph": "12",
                "weatherDesc": [{ "value": "Partly cloudy" }]
            }],
            "nearest_area": [{
                "areaName": [{ "value": "Jakarta" }]
            }]
        });

        let condensed = WeatherTool::condense("jakarta", &payload).unwrap();
        assert_eq!(condensed["city"], "Jakarta");
        assert_eq!(condensed["description"], "Partly cloudy");
        assert_eq!(condensed["temperature_c"], "31");
        assert_eq!(condensed["humidity_pct"], "70");
    }

    #[test]
    fn condense_rejects_empty_payload() {
        let err = WeatherTool::condense("nowhere", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_city_is_invalid_args() {
        let tool = WeatherTool::new();
        let err = tool
            .invoke(&json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));

        let err = tool
            .invoke(&json!({ "city": "   " }), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}
