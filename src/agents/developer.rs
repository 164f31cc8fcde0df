//! Scaffold Developer - generates a starter codebase for a specified feature.
//!
//! The stack is derived from the feature's tech preference. Every generated
//! file is rendered from a Tera template with the feature spec and stack in
//! the context, and the acceptance checklist references each criterion id so
//! the testing stage can trace coverage.

use std::path::Path;

use async_trait::async_trait;
use tera::{Context, Tera};
use tokio::fs;
use tracing::{debug, info};

use super::collaborators::Developer;
use super::error::AgentResult;
use super::feature_store::FeatureStore;
use super::types::{DevelopmentSummary, FeatureSpec, TechStack};

const README_TEMPLATE: &str = r#"# {{ title }}

{{ idea }}

## Stack

- Frontend: {{ stack.frontend }}
- Backend: {{ stack.backend }}
- Database: {{ stack.database }}

## User Stories
{% for story in stories %}
### {{ story.id }}

{{ story.story }}
{% for criterion in story.acceptance_criteria %}
- {{ criterion.id }}: {{ criterion.description }}{% endfor %}
{% endfor %}"#;

const BACKEND_HEADER_TEMPLATE: &str = r#"{{ comment }} {{ title }} backend ({{ stack.backend }})
{{ comment }}
{{ comment }} Routes:
{{ comment }}   GET /health
{% for story in stories %}{{ comment }}   {{ story.id }}: {{ story.story }}
{% endfor %}
"#;

const FRONTEND_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>{{ title }}</title>
  </head>
  <body>
    <h1>{{ title }}</h1>
    <div id="app" data-framework="{{ stack.frontend }}"></div>
  </body>
</html>
"#;

const ENV_TEMPLATE: &str = r#"PORT=3001
FRONTEND_PORT=3000
DATABASE_URL={{ database_url }}
"#;

const COMPOSE_TEMPLATE: &str = r#"services:
  backend:
    build: ./backend
    env_file: .env.example
    ports:
      - "3001:3001"
  frontend:
    image: nginx:alpine
    volumes:
      - ./frontend:/usr/share/nginx/html:ro
    ports:
      - "3000:80"
"#;

const CHECKLIST_TEMPLATE: &str = r#"# Acceptance checklist: {{ title }}
{% for story in stories %}{% for criterion in story.acceptance_criteria %}
- [ ] {{ criterion.id }} ({{ story.id }}): {{ criterion.description }}{% endfor %}{% endfor %}
"#;

/// Backend flavours: name, entry file, comment prefix and entry body.
struct Backend {
    name: &'static str,
    entry: &'static str,
    comment: &'static str,
    body: &'static str,
}

const NODE_BACKEND: Backend = Backend {
    name: "Node.js",
    entry: "backend/src/server.js",
    comment: "//",
    body: "const http = require(\"http\");\n\nhttp\n  .createServer((req, res) => {\n    res.writeHead(req.url === \"/health\" ? 200 : 404);\n    res.end();\n  })\n  .listen(process.env.PORT || 3001);\n",
};

const PYTHON_BACKEND: Backend = Backend {
    name: "FastAPI",
    entry: "backend/main.py",
    comment: "#",
    body: "from fastapi import FastAPI\n\napp = FastAPI()\n\n\n@app.get(\"/health\")\ndef health():\n    return {\"status\": \"ok\"}\n",
};

const RUST_BACKEND: Backend = Backend {
    name: "Axum",
    entry: "backend/src/main.rs",
    comment: "//",
    body: "use axum::{routing::get, Router};\n\n#[tokio::main]\nasync fn main() {\n    let app = Router::new().route(\"/health\", get(|| async { \"ok\" }));\n    let listener = tokio::net::TcpListener::bind(\"0.0.0.0:3001\").await.unwrap();\n    axum::serve(listener, app).await.unwrap();\n}\n",
};

const GO_BACKEND: Backend = Backend {
    name: "Go net/http",
    entry: "backend/main.go",
    comment: "//",
    body: "package main\n\nimport \"net/http\"\n\nfunc main() {\n\thttp.HandleFunc(\"/health\", func(w http.ResponseWriter, r *http.Request) { w.WriteHeader(200) })\n\thttp.ListenAndServe(\":3001\", nil)\n}\n",
};

fn select_backend(preference: &str) -> &'static Backend {
    if ["python", "fastapi", "django", "flask"]
        .iter()
        .any(|k| preference.contains(k))
    {
        &PYTHON_BACKEND
    } else if preference.contains("rust") || preference.contains("axum") {
        &RUST_BACKEND
    } else if preference.contains("go") && !preference.contains("mongo") {
        &GO_BACKEND
    } else {
        &NODE_BACKEND
    }
}

fn select_frontend(preference: &str) -> &'static str {
    if preference.contains("vue") {
        "Vue"
    } else if preference.contains("svelte") {
        "Svelte"
    } else {
        "React"
    }
}

fn select_database(preference: &str) -> &'static str {
    if preference.contains("mongo") {
        "MongoDB"
    } else if preference.contains("sqlite") {
        "SQLite"
    } else {
        "PostgreSQL"
    }
}

fn database_url(database: &str) -> &'static str {
    match database {
        "MongoDB" => "mongodb://localhost:27017/app",
        "SQLite" => "sqlite://./app.db",
        _ => "postgres://localhost:5432/app",
    }
}

/// Developer writing a minimal scaffold into `projects/{feature_id}/codebase`.
#[derive(Debug, Clone)]
pub struct ScaffoldDeveloper {
    store: FeatureStore,
}

impl ScaffoldDeveloper {
    pub const AGENT_NAME: &'static str = "dev";

    pub fn new(store: FeatureStore) -> Self {
        Self { store }
    }

    fn render(template: &str, context: &Context) -> AgentResult<String> {
        Ok(Tera::one_off(template, context, false)?)
    }

    async fn write(codebase: &Path, relative: &str, contents: &str) -> AgentResult<()> {
        let path = codebase.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, contents).await?;
        debug!(file = %path.display(), "Scaffold file written");
        Ok(())
    }

    /// Renders every scaffold file, returning `(relative path, contents)` pairs.
    fn render_files(spec: &FeatureSpec, stack: &TechStack) -> AgentResult<Vec<(String, String)>> {
        let preference = spec.tech_preference.clone().unwrap_or_default().to_lowercase();
        let backend = select_backend(&preference);

        let mut context = Context::new();
        context.insert("title", &spec.title);
        context.insert("idea", &spec.idea);
        context.insert("stories", &spec.user_stories);
        context.insert("stack", stack);
        context.insert("comment", backend.comment);
        context.insert("database_url", database_url(&stack.database));

        let backend_source = format!(
            "{}\n{}",
            Self::render(BACKEND_HEADER_TEMPLATE, &context)?,
            backend.body
        );

        Ok(vec![
            ("README.md".to_string(), Self::render(README_TEMPLATE, &context)?),
            (backend.entry.to_string(), backend_source),
            (
                "frontend/index.html".to_string(),
                Self::render(FRONTEND_TEMPLATE, &context)?,
            ),
            (".env.example".to_string(), Self::render(ENV_TEMPLATE, &context)?),
            (
                "docker-compose.yml".to_string(),
                Self::render(COMPOSE_TEMPLATE, &context)?,
            ),
            (
                "tests/ACCEPTANCE.md".to_string(),
                Self::render(CHECKLIST_TEMPLATE, &context)?,
            ),
        ])
    }
}

/// Derives the stack from a free-text preference such as `"python + vue"`.
pub fn stack_for_preference(preference: Option<&str>) -> TechStack {
    let preference = preference.unwrap_or_default().to_lowercase();
    let database = select_database(&preference);
    TechStack {
        frontend: select_frontend(&preference).to_string(),
        backend: select_backend(&preference).name.to_string(),
        database: database.to_string(),
    }
}

#[async_trait]
impl Developer for ScaffoldDeveloper {
    async fn develop(&self, feature_id: &str) -> AgentResult<DevelopmentSummary> {
        let mut spec = self.store.load(feature_id).await?;
        let stack = stack_for_preference(spec.tech_preference.as_deref());
        let codebase = self.store.codebase_dir(feature_id);

        info!(
            feature_id,
            frontend = %stack.frontend,
            backend = %stack.backend,
            "Generating codebase"
        );

        let files = Self::render_files(&spec, &stack)?;
        for (relative, contents) in &files {
            Self::write(&codebase, relative, contents).await?;
        }

        spec.generated_files = files.into_iter().map(|(path, _)| path).collect();
        spec.codebase_dir = Some(codebase);
        spec.tech_stack = Some(stack.clone());
        spec.status = "developed".to_string();
        self.store.save(&mut spec).await?;

        Ok(DevelopmentSummary {
            feature_id: feature_id.to_string(),
            tech_stack_used: stack,
            files_generated_count: spec.generated_files.len(),
        })
    }
}
