//! Prompt templates, one per agent kind
//!
//! Prompts are pure functions of the request fields each agent uses, so the
//! same request always produces byte-identical prompts (and cache keys).

use super::AgentKind;
use crate::project::ProjectRequest;

/// Build the prompt `kind` sends for `request`
pub fn build_prompt(kind: AgentKind, request: &ProjectRequest) -> String {
    let brief = request.brief.as_str();
    let hours = request.time_hours;

    match kind {
        AgentKind::Planner => format!(
            "Plan the tasks for a hackathon project based on this brief: {brief}. \
             The team has a budget of {hours} hours. \
             Return JSON with keys: nodes (list of tasks with id, title, description, estimate_hours) \
             and edges (list of {{from, to}} dependencies between task ids)."
        ),
        AgentKind::Ideation => format!(
            "You are an ideation assistant for a hackathon team. Given the brief:\n{brief}\n\
             Produce 6 distinct hackathon project ideas as a JSON list of \
             {{title, pitch, tech, novelty}} objects."
        ),
        AgentKind::Research => format!(
            "Research for the idea: {brief}. Provide 5 papers or URLs, 3 APIs and 3 libraries, \
             each with a short summary. Return JSON with keys: papers, apis, libraries."
        ),
        AgentKind::Planning => format!(
            "Plan a roadmap for the idea {brief} to be delivered in {hours} hours. \
             Return JSON with keys: milestones (list with name and deadline_hour) and \
             tasks (list with title, owner, estimate_hours, milestone)."
        ),
        AgentKind::Coding => format!(
            "Generate a starter repository for the idea {brief}: a README, a requirements file, \
             an app.py skeleton and one example file. \
             Return JSON with key files: a list of {{path, content}} objects."
        ),
        AgentKind::Presentation => format!(
            "Create 6 slide outlines and a 200-word pitch for {brief}. \
             Include a demo script and resources. \
             Return a JSON object with keys: slides_outline (list of {{title, bullets}}), pitch, \
             demo_script, resources. If possible, also create shareable slides and include a \
             publicly accessible PPTX download URL as 'slides_link'. \
             If not possible, set 'slides_link' to null."
        ),
        AgentKind::Evaluator => format!(
            "Evaluate the project idea '{title}'. Brief: {brief}. \
             Return JSON with keys: risks (list), feasibility (low/medium/high), \
             impact (1-10), recommendations (list).",
            title = request.title
        ),
    }
}
