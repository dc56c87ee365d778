//! Single-page scanner UI

use actix_web::HttpResponse;

/// Scanner page
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sentinel Scan</title>
<style>
  body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; max-width: 860px; margin: 2rem auto; padding: 0 1rem; }
  h1 { font-size: 1.6rem; }
  .card { background: #111827; border: 1px solid #1f2937; border-radius: 12px; padding: 1.25rem; margin: 1rem 0; }
  input[type=url] { width: 70%; padding: .6rem; border-radius: 8px; border: 1px solid #334155; background: #020617; color: inherit; font-family: monospace; }
  button { padding: .6rem 1rem; border-radius: 8px; border: 0; background: #2563eb; color: white; cursor: pointer; }
  button:disabled, input:disabled { opacity: .5; cursor: default; }
  .badge { display: inline-block; padding: .1rem .6rem; border-radius: 999px; font-size: .75rem; font-weight: bold; border: 1px solid; }
  .LOW { color: #34d399; } .MEDIUM { color: #fbbf24; } .HIGH { color: #fb923c; } .CRITICAL { color: #f87171; }
  .error { background: #3f1d2b; border-color: #7f1d1d; color: #fda4af; }
  .muted { color: #64748b; font-size: .8rem; }
  .history { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: .75rem; }
  .history .card { margin: 0; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; font-family: monospace; }
  [hidden] { display: none !important; }
</style>
</head>
<body>
<h1>Sentinel Scan</h1>
<p class="muted">Submit a URL or a file (max 5 MB) for an AI-assisted security risk report.</p>

<div class="card">
  <form id="url-form">
    <input id="url" type="url" placeholder="https://example.com/suspicious-path" required>
    <button id="url-submit" type="submit">Scan URL</button>
  </form>
  <p><input id="file" type="file"></p>
</div>

<div id="loading" class="card" hidden>Analyzing&hellip;</div>
<div id="error" class="card error" hidden></div>
<div id="result" class="card" hidden></div>

<section id="history-section" hidden>
  <h2>Recent Scans</h2>
  <div id="history" class="history"></div>
</section>

<script>
const MAX_BYTES = 5 * 1024 * 1024;
const $ = (id) => document.getElementById(id);

function el(tag, text, cls) {
  const node = document.createElement(tag);
  if (text !== undefined) node.textContent = text;
  if (cls) node.className = cls;
  return node;
}

function setBusy(busy) {
  $("loading").hidden = !busy;
  for (const id of ["url", "url-submit", "file"]) $(id).disabled = busy;
  if (busy) { $("error").hidden = true; $("result").hidden = true; $("history-section").hidden = true; }
}

function showError(message) {
  $("error").textContent = message || "An unexpected error occurred during the scan. Please try again.";
  $("error").hidden = false;
}

function list(title, items) {
  const box = el("div");
  box.appendChild(el("h3", title));
  const ul = el("ul");
  for (const item of items) ul.appendChild(el("li", item));
  if (!items.length) ul.appendChild(el("li", "(none)", "muted"));
  box.appendChild(ul);
  return box;
}

function showResult(r) {
  const box = $("result");
  box.replaceChildren();
  const head = el("h2", r.target + " ");
  head.appendChild(el("span", r.riskLevel, "badge " + r.riskLevel));
  box.appendChild(head);
  box.appendChild(el("p", "Risk score: " + r.riskScore + "/100 (" + r.type + ")"));
  box.appendChild(el("p", r.analysis));
  box.appendChild(list("Findings", r.findings));
  box.appendChild(list("Recommendations", r.recommendations));
  if (r.sources && r.sources.length) {
    box.appendChild(el("h3", "Sources"));
    const ul = el("ul");
    for (const s of r.sources) {
      const li = el("li");
      const a = el("a", s.title || s.uri);
      a.href = s.uri; a.target = "_blank"; a.rel = "noopener";
      li.appendChild(a);
      ul.appendChild(li);
    }
    box.appendChild(ul);
  }
  box.hidden = false;
}

async function loadHistory() {
  const items = await (await fetch("/api/history")).json();
  const grid = $("history");
  grid.replaceChildren();
  for (const item of items) {
    const card = el("div", undefined, "card");
    card.appendChild(el("span", item.riskLevel, "badge " + item.riskLevel));
    card.appendChild(el("span", " " + new Date(item.timestamp).toLocaleDateString(), "muted"));
    card.appendChild(el("div", item.target));
    grid.appendChild(card);
  }
  $("history-section").hidden = items.length === 0 || !$("result").hidden;
}

async function scan(path, body) {
  setBusy(true);
  try {
    const resp = await fetch(path, { method: "POST", headers: { "Content-Type": "application/json" }, body: JSON.stringify(body) });
    const data = await resp.json().catch(() => ({}));
    if (resp.ok) showResult(data); else showError(data.error);
  } catch (e) {
    showError(e.message);
  } finally {
    setBusy(false);
    loadHistory();
  }
}

$("url-form").addEventListener("submit", (e) => {
  e.preventDefault();
  const url = $("url").value.trim();
  if (url) scan("/api/scan/url", { url });
});

$("file").addEventListener("change", (e) => {
  const file = e.target.files[0];
  if (!file) return;
  if (file.size > MAX_BYTES) { showError(file.name + " is larger than 5 MB"); return; }
  const reader = new FileReader();
  reader.onload = () => {
    const content = String(reader.result).split(",")[1] || "";
    scan("/api/scan/file", { name: file.name, mimeType: file.type || "application/octet-stream", content });
  };
  reader.readAsDataURL(file);
});

loadHistory();
</script>
</body>
</html>
"#;
