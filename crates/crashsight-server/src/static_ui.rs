pub const UI_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CrashSight</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #F3F4F6;
            color: #1f2937;
        }
        header {
            background: #1A73E8;
            color: white;
            padding: 14px 24px;
            font-size: 18px;
            font-weight: 500;
            cursor: pointer;
        }
        .toolbar {
            background: white;
            border-bottom: 1px solid #e5e7eb;
            padding: 12px 24px;
            display: flex;
            gap: 12px;
            align-items: center;
            flex-wrap: wrap;
        }
        .toolbar select, .toolbar input {
            padding: 6px 10px;
            border: 1px solid #d1d5db;
            border-radius: 4px;
            font-size: 14px;
        }
        .toolbar input[type=text] { width: 280px; margin-left: auto; }
        main { max-width: 1400px; margin: 0 auto; padding: 24px; }
        .summary { color: #6b7280; font-size: 14px; margin-bottom: 12px; }
        table { width: 100%; border-collapse: collapse; background: white; border-radius: 8px; overflow: hidden; }
        th, td { padding: 10px 14px; text-align: left; border-bottom: 1px solid #f3f4f6; font-size: 14px; }
        th { background: #f9fafb; color: #6b7280; font-weight: 600; font-size: 12px; text-transform: uppercase; }
        tr.row { cursor: pointer; }
        tr.row:hover { background: #eff6ff; }
        .site { font-family: monospace; font-weight: 600; }
        .msg { color: #6b7280; font-size: 12px; }
        .badge { padding: 2px 8px; border-radius: 4px; font-size: 11px; font-weight: 700; }
        .NEW { background: #dbeafe; color: #1e40af; }
        .OPEN { background: #fee2e2; color: #991b1b; }
        .REGRESSION { background: #fef3c7; color: #92400e; }
        .CLOSED { background: #dcfce7; color: #166534; }
        .spark { display: inline-flex; align-items: flex-end; height: 20px; gap: 1px; }
        .spark span { width: 3px; background: #93c5fd; }
        .card { background: white; border-radius: 8px; padding: 16px; margin-bottom: 16px; }
        .bar { height: 8px; background: #1A73E8; border-radius: 4px; }
        .variant { padding: 8px; cursor: pointer; border-radius: 4px; }
        .variant.active { background: #eff6ff; }
        .frame { font-family: monospace; font-size: 12px; padding: 2px 0; color: #9ca3af; }
        .frame.app { color: #111827; font-weight: 600; }
        .note { background: #fefce8; border: 1px solid #fde68a; border-radius: 4px; padding: 8px; margin-top: 8px; font-size: 13px; }
        button { padding: 6px 12px; border-radius: 4px; border: 1px solid #d1d5db; background: white; cursor: pointer; }
        button.primary { background: #1A73E8; color: white; border: none; }
        textarea { width: 100%; min-height: 60px; margin-top: 8px; padding: 6px; }
        .hidden { display: none; }
    </style>
</head>
<body>
    <header onclick="showList()">CrashSight</header>
    <div class="toolbar" id="toolbar">
        <select id="builds" multiple size="1" onchange="loadIssues()"></select>
        <select id="range" onchange="loadIssues()">
            <option value="1h">Last 1 hour</option>
            <option value="24h">Last 24 hours</option>
            <option value="yesterday">Yesterday</option>
            <option value="7d">Last 7 days</option>
            <option value="30d" selected>Last 30 days</option>
        </select>
        <input type="text" id="search" placeholder="Search class name or exception message..." oninput="loadIssues()">
    </div>
    <main>
        <div id="list">
            <div class="summary" id="summary"></div>
            <table>
                <thead>
                    <tr><th>Issue</th><th>Versions</th><th>Trend</th><th>Events</th><th>Users</th></tr>
                </thead>
                <tbody id="rows"></tbody>
            </table>
        </div>
        <div id="detail" class="hidden"></div>
    </main>
    <script>
        let current = null;
        let focus = null;
        let page = 0;

        function esc(s) {
            return String(s).replace(/[&<>"]/g, c => ({'&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;'}[c]));
        }

        function spark(history) {
            const max = Math.max(1, ...history);
            return '<div class="spark">' + history.map(c => `<span style="height:${Math.max(1, c * 20 / max)}px"></span>`).join('') + '</div>';
        }

        async function loadVersions() {
            const versions = await (await fetch('/versions')).json();
            const select = document.getElementById('builds');
            select.innerHTML = '';
            for (const v of versions) {
                const group = document.createElement('optgroup');
                group.label = `${v.versionName} (${v.eventTotal})`;
                for (const b of v.builds) {
                    const opt = document.createElement('option');
                    opt.value = b.buildNumber;
                    opt.textContent = b.buildNumber;
                    group.appendChild(opt);
                }
                select.appendChild(group);
            }
        }

        async function loadIssues() {
            const builds = [...document.getElementById('builds').selectedOptions].map(o => o.value).join(',');
            const params = new URLSearchParams({
                search: document.getElementById('search').value,
                builds,
                range: document.getElementById('range').value,
            });
            const data = await (await fetch('/issues?' + params)).json();
            document.getElementById('summary').textContent = `${data.total} issues · ${data.timeRange}`;
            document.getElementById('rows').innerHTML = data.issues.map(i => `
                <tr class="row" onclick="showDetail('${esc(i.id)}')">
                    <td><span class="badge ${i.status}">${i.status}</span>
                        <span class="site">${esc(i.site)}</span>
                        <div class="msg">${esc(i.topMessage)}</div></td>
                    <td>${esc(i.firstSeenVersion)} - ${esc(i.lastSeenVersion)}</td>
                    <td>${spark(i.history)}</td>
                    <td>${i.totalEvents.toLocaleString()}</td>
                    <td>${i.affectedUsers.toLocaleString()}</td>
                </tr>`).join('');
        }

        function showList() {
            current = null;
            document.getElementById('detail').classList.add('hidden');
            document.getElementById('list').classList.remove('hidden');
            document.getElementById('toolbar').classList.remove('hidden');
            loadIssues();
        }

        async function showDetail(id) {
            current = id;
            focus = null;
            page = 0;
            document.getElementById('list').classList.add('hidden');
            document.getElementById('toolbar').classList.add('hidden');
            document.getElementById('detail').classList.remove('hidden');
            await renderDetail();
        }

        async function renderDetail() {
            const issue = await (await fetch(`/issues/${current}`)).json();
            const q = new URLSearchParams({ page });
            if (focus !== null) q.set('variant', focus);
            const ev = await (await fetch(`/issues/${current}/events?` + q)).json();
            const closed = issue.status === 'CLOSED';
            const frames = ev.event ? ev.event.stackTrace.map(f =>
                `<div class="frame ${f.isAppCode ? 'app' : ''}">at ${esc(f.library)}.${esc(f.method)}(${esc(f.file)}:${f.line})</div>`).join('') : '';
            document.getElementById('detail').innerHTML = `
                <div class="card">
                    <span class="badge ${issue.status}">${issue.status}</span>
                    <span class="site">${esc(issue.className.split('.').pop())}.${esc(issue.methodName)}</span>
                    <div class="msg">${esc(issue.variants[0] ? issue.variants[0].message : '')}</div>
                    <div style="margin-top:8px">
                        ${closed ? '' : '<button class="primary" onclick="act(\'close\')">Close issue</button>'}
                        <button onclick="act('notes')">Add note</button>
                        <button onclick="exportIssue()">Export</button>
                    </div>
                    <textarea id="note" placeholder="Note"></textarea>
                    ${issue.notes.map(n => `<div class="note"><b>${esc(n.author)}</b> ${new Date(n.date).toLocaleString()} ${n.action === 'closed' ? '(closed)' : ''}<br>${esc(n.content)}</div>`).join('')}
                </div>
                <div class="card">
                    <div class="variant ${focus === null ? 'active' : ''}" onclick="setFocus(null)">All events (${issue.totalEvents})</div>
                    ${ev.variants.map((v, i) => `
                        <div class="variant ${focus === i ? 'active' : ''}" onclick="setFocus(${i})">
                            <div>#${i + 1} ${esc(v.exceptionType)}: ${esc(v.message)} (${v.count})</div>
                            <div class="bar" style="width:${v.share}%"></div>
                        </div>`).join('')}
                </div>
                <div class="card">
                    <b>${esc(ev.title)}</b> · ${ev.affectedUsers} users ·
                    <button onclick="step(-1)">&lt;</button> ${ev.position} <button onclick="step(1)">&gt;</button>
                    ${ev.event ? `<div class="msg">${esc(ev.event.deviceModel)} · ${esc(ev.event.osVersion)} · ${esc(ev.event.appVersion)} (${esc(ev.event.buildNumber)}) · ${new Date(ev.event.timestamp).toLocaleString()}</div>` : ''}
                    <div style="margin-top:8px">${frames}</div>
                </div>`;
        }

        function setFocus(i) { focus = i; page = 0; renderDetail(); }
        function step(d) { page = Math.max(0, page + d); renderDetail(); }

        async function act(kind) {
            const content = document.getElementById('note').value;
            if (!content.trim()) return;
            const res = await fetch(`/issues/${current}/${kind}`, {
                method: 'POST',
                headers: { 'content-type': 'application/json' },
                body: JSON.stringify({ content }),
            });
            if (!res.ok) alert((await res.json()).error);
            renderDetail();
        }

        async function exportIssue() {
            const res = await fetch(`/issues/${current}/export`, { method: 'POST' });
            const body = await res.json();
            alert(res.ok ? `Exported: ${body.path}` : body.error);
        }

        loadVersions().then(loadIssues);
    </script>
</body>
</html>
"#;
