use axum::response::Html;

/// `GET /`: upload form that calls the JSON API and offers the markdown
/// as a download.
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE_HTML)
}

const UPLOAD_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Case Chronology</title>
  <style>
    * { box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917; margin: 0; padding: 32px;
      display: flex; flex-direction: column; align-items: center;
    }
    main { width: 100%; max-width: 960px; }
    h1 { font-size: 26px; margin: 0 0 8px; }
    p.hint { color: #78716c; font-size: 14px; margin: 0 0 24px; }
    label { display: block; font-weight: 600; margin: 16px 0 6px; }
    textarea { width: 100%; min-height: 90px; padding: 10px; border: 1px solid #d6d3d1; border-radius: 8px; font: inherit; }
    .btn {
      margin-top: 20px; padding: 12px 20px; border: none; border-radius: 8px;
      background: #1e3a5f; color: #fff; font-size: 15px; cursor: pointer;
    }
    .btn:disabled { opacity: 0.5; cursor: wait; }
    .btn.secondary { background: #4a7c59; }
    #status { margin-top: 16px; font-size: 14px; }
    #status.error { color: #b91c1c; }
    #issues li { color: #92400e; font-size: 13px; }
    pre { background: #fff; border: 1px solid #e7e5e4; border-radius: 8px; padding: 16px; overflow-x: auto; white-space: pre-wrap; }
  </style>
</head>
<body>
  <main>
    <h1>Case Chronology</h1>
    <p class="hint">Upload case documents (PDF with a text layer, or plain text). Scanned PDFs are not supported.</p>
    <form id="form">
      <label for="files">Documents</label>
      <input id="files" name="files" type="file" accept=".pdf,.txt,.md,application/pdf,text/plain" multiple required>
      <label for="case">Case description</label>
      <textarea id="case" name="case_description" placeholder="Short description of the matter"></textarea>
      <button class="btn" id="submit" type="submit">Generate chronology</button>
    </form>
    <div id="status"></div>
    <ul id="issues"></ul>
    <div id="result" hidden>
      <button class="btn secondary" id="download" type="button">Download chronology.md</button>
      <pre id="markdown"></pre>
    </div>
  </main>
  <script>
    const form = document.getElementById('form');
    const statusEl = document.getElementById('status');
    const issuesEl = document.getElementById('issues');
    const result = document.getElementById('result');
    const markdownEl = document.getElementById('markdown');
    const submit = document.getElementById('submit');
    let markdown = '';

    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      submit.disabled = true;
      statusEl.className = '';
      statusEl.textContent = 'Processing documents...';
      issuesEl.innerHTML = '';
      result.hidden = true;
      try {
        const response = await fetch('/api/v1/chronology/generate', { method: 'POST', body: new FormData(form) });
        const body = await response.json();
        if (!response.ok) {
          throw new Error(body.error ? body.error.message : 'Request failed');
        }
        markdown = body.markdownOutput;
        markdownEl.textContent = markdown;
        for (const issue of body.issues) {
          const li = document.createElement('li');
          li.textContent = issue.documentName + ': ' + issue.message;
          issuesEl.appendChild(li);
        }
        statusEl.textContent = 'Chronology generated from ' + body.processedDocuments.length + ' document(s).';
        result.hidden = false;
      } catch (err) {
        statusEl.className = 'error';
        statusEl.textContent = err.message;
      } finally {
        submit.disabled = false;
      }
    });

    document.getElementById('download').addEventListener('click', () => {
      const blob = new Blob([markdown], { type: 'text/markdown' });
      const link = document.createElement('a');
      link.href = URL.createObjectURL(blob);
      link.download = 'chronology.md';
      link.click();
      URL.revokeObjectURL(link.href);
    });
  </script>
</body>
</html>
"#;
