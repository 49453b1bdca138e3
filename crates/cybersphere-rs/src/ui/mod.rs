pub async fn index() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"
<!doctype html>
<html lang="fr">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>CyberSphere-RS</title>
  <style>
    :root {
      --bg: #0b1220;
      --card: #131d33;
      --line: #263551;
      --text: #e5ecff;
      --muted: #9eb0d6;
      --accent: #5cc8ff;
      --ok: #41d38a;
      --warn: #f7b955;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      font-family: Inter, Segoe UI, Roboto, sans-serif;
      background: radial-gradient(circle at 15% -10%, #1f3566, var(--bg));
      color: var(--text);
    }
    .container { max-width: 1200px; margin: 0 auto; padding: 24px; }
    .header { display: flex; justify-content: space-between; align-items: center; gap: 16px; }
    .title { margin: 0; font-size: 1.9rem; }
    .subtitle { margin: 8px 0 0; color: var(--muted); }
    .badge { padding: 6px 10px; border-radius: 999px; border: 1px solid var(--line); background: #0f1729; }
    .row { display: grid; grid-template-columns: 320px 1fr; gap: 16px; margin-top: 16px; }
    .card {
      background: color-mix(in oklab, var(--card) 94%, black);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 16px;
      box-shadow: 0 10px 35px rgba(0,0,0,.18);
    }
    label { display: block; margin: 10px 0 6px; color: var(--muted); font-size: .9rem; }
    input, select, button, textarea {
      width: 100%; border-radius: 10px; border: 1px solid var(--line); background: #0d1629;
      color: var(--text); padding: 10px 12px;
    }
    textarea { min-height: 110px; font-family: ui-monospace, monospace; font-size: .85rem; }
    button { background: linear-gradient(90deg, #1b7cff, #2ca0ff); border: none; font-weight: 600; cursor: pointer; }
    button.secondary { background: #1b2740; border: 1px solid var(--line); }
    .status { margin-top: 10px; color: var(--muted); font-size: .9rem; min-height: 22px; }
    .tables { display: grid; gap: 16px; margin-top: 16px; }
    table { width: 100%; border-collapse: collapse; font-size: .9rem; }
    th, td { padding: 8px 10px; border-bottom: 1px solid var(--line); text-align: left; }
    th { color: var(--muted); font-weight: 600; }
    pre { background: #0d1629; border: 1px solid var(--line); border-radius: 10px; padding: 12px; overflow: auto; font-size: .82rem; }
    .pill { border-radius: 999px; padding: 2px 9px; font-size: .78rem; border: 1px solid var(--line); }
    .pill.healthy, .pill.task_result { color: var(--ok); }
    .pill.unhealthy, .pill.task_error { color: var(--warn); }
    @media (max-width: 980px) { .row { grid-template-columns: 1fr; } }
  </style>
</head>
<body>
  <main class="container">
    <header class="header card">
      <div>
        <h1 class="title">CyberSphere-RS</h1>
        <p class="subtitle">Console locale pour le dispatcher de tâches (scans, parsing, santé, journal).</p>
      </div>
      <span class="badge" id="healthBadge">santé inconnue</span>
    </header>

    <section class="row">
      <aside class="card">
        <h3>Exécuter une tâche</h3>
        <label>Tâche</label>
        <select id="taskName">
          <option>ai_process</option>
          <option>security_scan</option>
          <option>data_parse</option>
          <option>web_automation</option>
        </select>
        <label>Paramètres (JSON)</label>
        <textarea id="params">{"target": "127.0.0.1", "scan_type": "port_scan", "port_range": "1-1024"}</textarea>
        <button id="runBtn">Exécuter</button>
        <button class="secondary" id="refreshBtn" style="margin-top:8px">Rafraîchir</button>
        <div class="status" id="status">Prêt.</div>
      </aside>

      <section>
        <div class="tables">
          <article class="card">
            <h3>Résultat</h3>
            <pre id="result">—</pre>
          </article>
          <article class="card">
            <h3>Composants</h3>
            <table><thead><tr><th>Composant</th><th>Statut</th><th>Latence (s)</th></tr></thead><tbody id="healthBody"></tbody></table>
          </article>
          <article class="card">
            <h3>Journal des tâches</h3>
            <table><thead><tr><th>Type</th><th>Données</th><th>Horodatage</th></tr></thead><tbody id="eventsBody"></tbody></table>
          </article>
        </div>
      </section>
    </section>
  </main>

<script>
const statusEl = document.getElementById('status');

const api = async (url, opts = {}) => {
  const headers = Object.assign({ 'Content-Type': 'application/json' }, opts.headers || {});
  const resp = await fetch(url, Object.assign({}, opts, { headers }));
  if (!resp.ok) throw new Error(await resp.text());
  return resp.json();
};

const setRows = (elId, rows, cols) => {
  const body = document.getElementById(elId);
  body.innerHTML = rows.map((r) => `<tr>${cols.map((c) => `<td>${c(r)}</td>`).join('')}</tr>`).join('') || '<tr><td colspan="3">Aucune donnée</td></tr>';
};

async function refreshAll() {
  const [health, events] = await Promise.all([
    api('/api/health'),
    api('/api/events?limit=8'),
  ]);

  document.getElementById('healthBadge').textContent = `système: ${health.status}`;
  const components = Object.entries(health.components || {}).map(([name, c]) => Object.assign({ name }, c));
  setRows('healthBody', components, [
    (r) => r.name,
    (r) => `<span class="pill ${r.status}">${r.status}</span>`,
    (r) => r.response_time !== undefined ? r.response_time.toFixed(3) : '-',
  ]);
  setRows('eventsBody', events.history || [], [
    (r) => `<span class="pill ${r.event_type}">${r.event_type}</span>`,
    (r) => r.data.slice(0, 80),
    (r) => r.timestamp,
  ]);

  statusEl.textContent = `Dernière MAJ: ${new Date().toLocaleTimeString()}`;
}

document.getElementById('runBtn').onclick = async () => {
  try {
    const task_name = document.getElementById('taskName').value;
    const params = JSON.parse(document.getElementById('params').value || '{}');
    statusEl.textContent = 'Exécution en cours...';
    const data = await api('/api/tasks/execute', { method: 'POST', body: JSON.stringify({ task_name, params }) });
    document.getElementById('result').textContent = JSON.stringify(data, null, 2);
    statusEl.textContent = data.error ? 'Terminé avec erreur.' : 'Terminé.';
    setTimeout(refreshAll, 300);
  } catch (e) {
    statusEl.textContent = `Erreur: ${e.message}`;
  }
};

document.getElementById('refreshBtn').onclick = () => refreshAll().catch(e => statusEl.textContent = `Erreur refresh: ${e.message}`);
refreshAll().catch(() => { statusEl.textContent = 'API indisponible.'; });
</script>
</body>
</html>
"#,
    )
}
