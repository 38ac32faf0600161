//! JSON bodies exchanged with the AI service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST {base}/bestmove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMoveRequest {
    pub fen: String,
    pub history_uci: Vec<String>,
    pub think_ms: u64,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Reply from the AI service.
///
/// Only `move` is required. Metadata of an unexpected shape reads as absent
/// rather than failing the whole body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BestMoveResponse {
    #[serde(rename = "move", default)]
    pub mv: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<WireScore>,
    #[serde(default, deserialize_with = "lenient")]
    pub depth: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub nodes: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pv: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireScore {
    #[serde(default, deserialize_with = "lenient")]
    pub cp: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub mate: Option<i32>,
}

/// Decode a field, mapping any value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Score reported alongside a move, from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; negative when the mover is being mated.
    Mate(i32),
}

impl WireScore {
    /// Mate scores take precedence over centipawns.
    pub fn to_score(self) -> Option<Score> {
        match (self.mate, self.cp) {
            (Some(m), _) => Some(Score::Mate(m)),
            (None, Some(cp)) => Some(Score::Centipawns(cp)),
            (None, None) => None,
        }
    }
}

/// Optional search metadata that comes with an AI move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub score: Option<Score>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub pv: Vec<String>,
    pub elapsed_ms: Option<u64>,
}

impl From<&BestMoveResponse> for Evaluation {
    fn from(resp: &BestMoveResponse) -> Self {
        Self {
            score: resp.score.and_then(WireScore::to_score),
            depth: resp.depth,
            nodes: resp.nodes,
            pv: resp.pv.clone().unwrap_or_default(),
            elapsed_ms: resp.elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_field_names() {
        let req = BestMoveRequest {
            fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            history_uci: vec!["e2e4".to_string()],
            think_ms: 2000,
            options: serde_json::Map::new(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["think_ms"], 2000);
        assert_eq!(value["history_uci"][0], "e2e4");
        assert!(value["options"].as_object().unwrap().is_empty());
    }

    #[test]
    fn minimal_response_only_needs_a_move() {
        let resp: BestMoveResponse = serde_json::from_str(r#"{"move": "e7e5"}"#).unwrap();
        assert_eq!(resp.mv.as_deref(), Some("e7e5"));
        assert_eq!(Evaluation::from(&resp), Evaluation::default());
    }

    #[test]
    fn full_response_maps_to_evaluation() {
        let resp: BestMoveResponse = serde_json::from_str(
            r#"{"move":"e7e5","score":{"cp":-31},"depth":18,"nodes":123456,
                "pv":["e7e5","g1f3"],"elapsed_ms":1875,"extra":true}"#,
        )
        .unwrap();
        let eval = Evaluation::from(&resp);
        assert_eq!(eval.score, Some(Score::Centipawns(-31)));
        assert_eq!(eval.depth, Some(18));
        assert_eq!(eval.nodes, Some(123456));
        assert_eq!(eval.pv, vec!["e7e5", "g1f3"]);
        assert_eq!(eval.elapsed_ms, Some(1875));
    }

    #[test]
    fn mate_wins_over_centipawns() {
        let wire = WireScore {
            cp: Some(500),
            mate: Some(3),
        };
        assert_eq!(wire.to_score(), Some(Score::Mate(3)));
    }

    #[test]
    fn odd_metadata_reads_as_absent() {
        for body in [
            r#"{"move":"e7e5","score":35}"#,
            r#"{"move":"e7e5","score":{"cp":12.5}}"#,
            r#"{"move":"e7e5","depth":-1}"#,
            r#"{"move":"e7e5","pv":"e7e5 g1f3"}"#,
            r#"{"move":"e7e5","nodes":"many","elapsed_ms":null}"#,
        ] {
            let resp: BestMoveResponse = serde_json::from_str(body).unwrap();
            assert_eq!(resp.mv.as_deref(), Some("e7e5"), "{}", body);
            assert_eq!(Evaluation::from(&resp), Evaluation::default(), "{}", body);
        }

        let resp: BestMoveResponse =
            serde_json::from_str(r#"{"move":"e7e5","score":{"cp":"x","mate":2},"depth":9}"#)
                .unwrap();
        let eval = Evaluation::from(&resp);
        assert_eq!(eval.score, Some(Score::Mate(2)));
        assert_eq!(eval.depth, Some(9));
    }

    #[test]
    fn move_of_the_wrong_type_fails_the_body() {
        assert!(serde_json::from_str::<BestMoveResponse>(r#"{"move":42}"#).is_err());
    }
}
