//! 静态文件服务模块

use std::path::Path;
use tracing::{error, info};

/// 创建默认的静态文件（仪表板单页）
pub fn create_default_static_files(static_dir: &str) {
    if let Err(e) = std::fs::create_dir_all(static_dir) {
        error!("Failed to create static directory: {}", e);
        return;
    }

    let index_path = Path::new(static_dir).join("index.html");
    if let Err(e) = std::fs::write(&index_path, INDEX_HTML) {
        error!("Failed to create index.html: {}", e);
        return;
    }

    info!("Default static files created in {}", static_dir);
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>容量规划仪表板</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #1b5e20 0%, #0d47a1 100%);
            min-height: 100vh;
            color: #333;
        }

        .container { max-width: 1200px; margin: 0 auto; padding: 20px; }

        .header { text-align: center; margin-bottom: 24px; color: white; }
        .header h1 { font-size: 2.2rem; margin-bottom: 8px; text-shadow: 0 2px 4px rgba(0,0,0,0.3); }
        .header p { font-size: 1.1rem; opacity: 0.9; }

        .toolbar { display: flex; gap: 10px; justify-content: center; margin-bottom: 24px; flex-wrap: wrap; }
        .toolbar button, .toolbar a {
            background: white; border: none; border-radius: 6px; padding: 10px 18px;
            font-size: 0.95rem; cursor: pointer; text-decoration: none; color: #1b5e20;
            box-shadow: 0 4px 12px rgba(0,0,0,0.15);
        }
        .toolbar button:hover, .toolbar a:hover { background: #e8f5e9; }

        .kpis { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 14px; margin-bottom: 24px; }
        .kpi {
            background: white; border-radius: 10px; padding: 18px;
            box-shadow: 0 10px 30px rgba(0,0,0,0.1); text-align: center;
        }
        .kpi .value { font-size: 1.8rem; font-weight: bold; color: #1b5e20; }
        .kpi .name { color: #666; margin-top: 4px; font-size: 0.9rem; }

        .panel {
            background: white; border-radius: 10px; padding: 24px;
            box-shadow: 0 10px 30px rgba(0,0,0,0.1); margin-bottom: 24px;
        }
        .panel h2 { color: #1b5e20; margin-bottom: 14px; font-size: 1.3rem; }

        .panel select { padding: 6px 10px; border-radius: 5px; border: 1px solid #bbb; margin-bottom: 12px; }
        .chart object { width: 100%; height: auto; }

        table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
        th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid #eee; }
        th { color: #666; font-weight: 600; }
        .badge {
            display: inline-block; padding: 3px 10px; border-radius: 10px;
            color: white; font-size: 0.8rem;
        }

        .footer { text-align: center; margin-top: 24px; color: white; opacity: 0.8; }
    </style>
</head>
<body>
    <div class="container">
        <header class="header">
            <h1>🏥 容量规划仪表板</h1>
            <p>计划 vs 预测、红绿灯状态与处置建议（合成数据 MVP）</p>
        </header>

        <div class="toolbar">
            <button id="btn-refresh">🔄 刷新预测</button>
            <button id="btn-reset">↩️ 恢复默认</button>
            <a href="/api/v1/export/csv">⬇️ 导出 CSV</a>
            <a id="link-svg" href="/api/v1/export/svg?resource=beds">⬇️ 导出 SVG</a>
        </div>

        <div class="kpis" id="kpis"></div>

        <div class="panel chart">
            <h2>年度曲线</h2>
            <select id="resource-select">
                <option value="beds">床位</option>
                <option value="operating_room">手术室</option>
                <option value="staff">护理人员</option>
                <option value="outpatient">门诊</option>
                <option value="emergency">急诊</option>
            </select>
            <object id="chart" type="image/svg+xml" data="/api/v1/export/svg?resource=beds"></object>
        </div>

        <div class="panel">
            <h2>红绿灯看板（最高优先级）</h2>
            <table>
                <thead>
                    <tr><th>周</th><th>资源</th><th>状态</th><th>归一化缺口</th><th>建议</th></tr>
                </thead>
                <tbody id="status-rows"></tbody>
            </table>
        </div>

        <footer class="footer">
            <p>© 2025 Capa - Built with Rust &amp; Axum</p>
            <p>无持久化 · 无用户管理 · 无实时数据接入</p>
        </footer>
    </div>

    <script>
        const LEVEL_META = {
            green:  { label: '绿', color: '#2e7d32' },
            yellow: { label: '黄', color: '#f9a825' },
            red:    { label: '红', color: '#c62828' },
            blue:   { label: '蓝', color: '#1565c0' },
        };
        const RESOURCE_LABELS = {
            beds: '床位', operating_room: '手术室', staff: '护理人员',
            outpatient: '门诊', emergency: '急诊',
        };

        async function loadKpis() {
            const resp = await fetch('/api/v1/kpis');
            const kpis = await resp.json();
            const tiles = [
                ['利用率', kpis.utilization_pct.toFixed(1) + '%'],
                ['预测误差 MAPE', kpis.mape_pct.toFixed(1) + '%'],
                ['等待天数', Math.round(kpis.wait_days)],
                ['取消率', kpis.cancellation_rate_pct.toFixed(1) + '%'],
                ['护理瓶颈', Math.round(kpis.nurse_shortage_score)],
            ];
            document.getElementById('kpis').innerHTML = tiles.map(
                ([name, value]) =>
                    '<div class="kpi"><div class="value">' + value +
                    '</div><div class="name">' + name + '</div></div>'
            ).join('');
        }

        async function loadStatus() {
            const resp = await fetch('/api/v1/status');
            const records = await resp.json();
            const rows = records.slice(0, 10).map(r => {
                const meta = LEVEL_META[r.level];
                return '<tr>' +
                    '<td>KW ' + r.week + '</td>' +
                    '<td>' + (RESOURCE_LABELS[r.resource] || r.resource) + '</td>' +
                    '<td><span class="badge" style="background:' + meta.color + '">' + meta.label + '</span></td>' +
                    '<td>' + (r.gap_norm * 100).toFixed(1) + '%</td>' +
                    '<td>' + r.recommendation + '</td>' +
                    '</tr>';
            });
            document.getElementById('status-rows').innerHTML = rows.join('');
        }

        document.getElementById('resource-select').addEventListener('change', e => {
            const url = '/api/v1/export/svg?resource=' + e.target.value;
            document.getElementById('chart').setAttribute('data', url);
            document.getElementById('link-svg').setAttribute('href', url);
        });

        document.getElementById('btn-refresh').addEventListener('click', async () => {
            await fetch('/api/v1/refresh', { method: 'POST' });
            location.reload();
        });

        document.getElementById('btn-reset').addEventListener('click', async () => {
            await fetch('/api/v1/config/reset', { method: 'POST' });
            location.reload();
        });

        loadKpis();
        loadStatus();
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_page_references_api() {
        assert!(INDEX_HTML.contains("/api/v1/kpis"));
        assert!(INDEX_HTML.contains("/api/v1/status"));
        assert!(INDEX_HTML.contains("/api/v1/export/csv"));
        assert!(INDEX_HTML.contains("/api/v1/export/svg"));
    }
}
