//! Prompt templates for the planner and evaluator models

use crate::agent::evaluator::EvaluationRequest;
use crate::agent::planner::PlanRequest;

const PLANNER_RESPONSE_FORMAT: &str = r#"{
  "currentState": {
    "evaluationPreviousGoal": "Success | Failed | Unknown, with a short explanation",
    "memory": "What has been done so far and what to remember for the next steps",
    "nextGoal": "What the next actions should achieve"
  },
  "actions": [
    { "name": "<action name>", "params": { ... }, "description": "Why this action" }
  ]
}"#;

const PLANNER_EXAMPLE: &str = r#"{
  "currentState": {
    "evaluationPreviousGoal": "Success - the login page is open",
    "memory": "On the login page. Username and password fields are visible.",
    "nextGoal": "Submit the login form"
  },
  "actions": [
    { "name": "fillInput", "params": { "index": 3, "text": "{{username}}" }, "description": "Enter the username" },
    { "name": "fillInput", "params": { "index": 4, "text": "{{password}}" }, "description": "Enter the password" },
    { "name": "clickElement", "params": { "index": 5 }, "description": "Submit the form" }
  ]
}"#;

/// System prompt of the planner
pub fn planner_system(max_actions: usize) -> String {
    format!(
        r#"You are a meticulous QA automation engineer driving a web browser to execute a test scenario.
Each turn you receive the current URL, a screenshot with numbered boxes, the list of page elements and the progress of the test so far.
Decide the next few actions and answer with JSON only.

PAGE ELEMENTS
Each line looks like [index]__<tag attribute="value">text</tag>.
Lines with a number are interactive and can be targeted by that number. The numbers match the labels drawn on the screenshot.
Lines with an empty index [] are context only and cannot be targeted.

RESPONSE FORMAT
{format}

Example:
{example}

ACTIONS
- clickElement: {{ "index": <element index> }}
- fillInput: {{ "index": <element index>, "text": <text> }}
- scrollDown: {{}}
- scrollUp: {{}}
- goToUrl: {{ "url": <url> }}
- takeScreenshot: {{}} (look at the page again without acting)
- triggerSuccess: {{ "reason": <what shows the scenario passed> }}
- triggerFailure: {{ "reason": <what shows the scenario failed> }}

RULES
1. Only use indexes present in the element list. An index is always a number.
2. Use at most {max_actions} actions per answer and stop at the first action that will change the page.
3. Never put anything after a scroll action; the page will be different afterwards.
4. triggerSuccess and triggerFailure must be the only action of an answer. Send them once the success or failure condition of the scenario is visibly met.
5. If the same step keeps failing, try another way. If nothing works, use triggerFailure and explain why.
6. Close cookie banners and popups when they get in the way.
7. Values written as {{{{name}}}} are variables. Copy them exactly as written, braces included; never guess their values.
8. If a field you filled still looks empty, or a suggestion list or calendar appeared, deal with it before moving on.
9. Keep "memory" up to date: it is the only thing you will remember next turn."#,
        format = PLANNER_RESPONSE_FORMAT,
        example = PLANNER_EXAMPLE,
        max_actions = max_actions,
    )
}

/// Per-cycle planner message
pub fn planner_user(request: &PlanRequest) -> String {
    let dom = if request.dom.trim().is_empty() {
        "(no elements could be read from the page)"
    } else {
        request.dom.as_str()
    };
    format!(
        "CURRENT URL: {}\n\nPAGE ELEMENTS:\n{}\n\nTEST SCENARIO AND PROGRESS:\n{}",
        request.url, dom, request.summary
    )
}

/// System prompt of the evaluator
pub fn evaluator_system() -> String {
    r#"You check the work of an agent that tested a website through a browser.
The agent claims the test scenario is complete. Decide whether the scenario's success condition is really met.

You receive the current URL, a screenshot of the page after the last action, the scenario and the agent's progress.

Answer with JSON only, in this format:
{ "status": "passed" | "failed", "reason": "what on the page supports the verdict" }

Rules:
- Trust the screenshot over the URL.
- Make reasonable assumptions: if a dialog the agent had to close is no longer visible, it was closed.
- If the evidence is inconclusive but nothing contradicts the agent, answer "passed"."#
        .to_string()
}

/// Evaluator message
pub fn evaluator_user(request: &EvaluationRequest) -> String {
    format!(
        "CURRENT URL: {}\n\nTEST SCENARIO: {}\n\nAGENT CLAIM: {}\n\nPROGRESS:\n{}",
        request.url, request.end_goal, request.claimed_reason, request.summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_system_mentions_limit_and_variables() {
        let prompt = planner_system(3);
        assert!(prompt.contains("at most 3 actions"));
        assert!(prompt.contains("{{name}}"));
        assert!(prompt.contains("\"index\": <element index>"));
    }

    #[test]
    fn test_planner_user_handles_empty_dom() {
        let request = PlanRequest {
            summary: "{}".into(),
            dom: String::new(),
            url: "https://example.com".into(),
            screenshot: None,
            max_actions: 5,
        };
        let message = planner_user(&request);
        assert!(message.contains("CURRENT URL: https://example.com"));
        assert!(message.contains("no elements could be read"));
    }
}
