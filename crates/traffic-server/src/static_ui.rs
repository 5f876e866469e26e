use traffic_core::MapConfig;

const CONFIG_PLACEHOLDER: &str = "__MAP_CONFIG__";
const SESSION_PLACEHOLDER: &str = "__SESSION_ID__";

/// Render the page with the map configuration embedded as JSON and the
/// session id the page sends back on every API call.
pub fn render(config: &MapConfig, session_id: &str) -> String {
    let json = serde_json::to_string(config)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c");
    UI_HTML
        .replace(CONFIG_PLACEHOLDER, &json)
        .replace(SESSION_PLACEHOLDER, session_id)
}

pub const UI_HTML: &str = r#"
<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>تتبع حوادث المرور في تونس</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: 'Noto Sans Arabic', -apple-system, 'Segoe UI', sans-serif;
            background: #F0F4F8;
            min-height: 100vh;
            padding: 16px;
            color: #1D3557;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto;
        }
        h1 {
            text-align: center;
            color: #E63946;
            font-size: 1.9em;
            margin-bottom: 24px;
            padding-bottom: 8px;
            border-bottom: 4px solid #1D3557;
        }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
            gap: 24px;
        }
        .card {
            background: white;
            border: 2px solid #1D3557;
            border-radius: 8px;
            overflow: hidden;
            box-shadow: 0 4px 6px rgba(0,0,0,0.1);
        }
        .card-header {
            background: #1D3557;
            color: white;
            padding: 12px 16px;
            font-size: 1.2em;
        }
        .card-content {
            padding: 16px;
        }
        form input, form textarea {
            width: 100%;
            padding: 8px;
            margin-bottom: 12px;
            border: 1px solid #1D3557;
            border-radius: 4px;
        }
        form button {
            width: 100%;
            padding: 10px;
            background: #E63946;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        form button:hover {
            background: #C1121F;
        }
        .form-error {
            color: #C1121F;
            font-size: 0.9em;
            min-height: 1.2em;
        }
        .loading {
            text-align: center;
            padding: 40px 0;
        }
        .gallery {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
            gap: 16px;
        }
        .incident {
            background: #F1FAEE;
            border: 1px solid #A8DADC;
            border-radius: 8px;
            padding: 12px;
        }
        .incident img {
            width: 100%;
            height: 128px;
            object-fit: cover;
            border-radius: 6px;
            margin-bottom: 8px;
        }
        .incident .caption {
            font-size: 0.8em;
            color: #457B9D;
        }
        .mt {
            margin-top: 24px;
        }
    </style>
</head>
<body data-session="__SESSION_ID__">
    <div class="container">
        <h1>تتبع حوادث المرور في تونس</h1>
        <div class="grid">
            <div class="card">
                <div class="card-header">إضافة حادث جديد</div>
                <div class="card-content">
                    <form id="incident-form">
                        <input id="lat" type="number" step="any" placeholder="خط العرض" aria-label="Latitude" required>
                        <input id="lng" type="number" step="any" placeholder="خط الطول" aria-label="Longitude" required>
                        <textarea id="description" placeholder="وصف الحادث" aria-label="Incident Description" required></textarea>
                        <input id="image" type="file" accept="image/*" aria-label="Upload Image" required>
                        <div class="form-error" id="form-error"></div>
                        <button type="submit">إضافة الحادث</button>
                    </form>
                </div>
            </div>
            <div class="card">
                <div class="card-header">خريطة الحوادث</div>
                <div class="card-content">
                    <div class="loading" id="map-loading">جاري تحميل الخريطة...</div>
                    <div id="map" style="display: none;"></div>
                </div>
            </div>
        </div>
        <div class="card mt">
            <div class="card-header">الحوادث الأخيرة</div>
            <div class="card-content">
                <div class="gallery" id="gallery"></div>
            </div>
        </div>
    </div>

    <script>
        const CONFIG = __MAP_CONFIG__;
        const SESSION_ID = document.body.dataset.session;
        const pending = new Set();
        let map = null;
        let markers = [];
        let markerRevision = -1;
        let cameraRevision = 0;

        async function api(method, path, body, contentType) {
            const options = { method, headers: { 'X-Session-Id': SESSION_ID } };
            if (body !== undefined) {
                options.body = body;
                options.headers['Content-Type'] = contentType || 'application/json';
            }
            const response = await fetch(path, options);
            const text = await response.text();
            return { status: response.status, data: text ? JSON.parse(text) : null };
        }

        // Edits still on the wire must land before a submit is sent.
        function track(request) {
            const done = () => pending.delete(request);
            pending.add(request);
            request.then(done, done);
            return request;
        }

        function patchDraft(fields) {
            return track(api('PATCH', '/api/draft', JSON.stringify(fields)));
        }

        function formFields() {
            return {
                lat: parseFloat(document.getElementById('lat').value),
                lng: parseFloat(document.getElementById('lng').value),
                description: document.getElementById('description').value,
            };
        }

        function fillForm(draft) {
            document.getElementById('lat').value = draft.lat;
            document.getElementById('lng').value = draft.lng;
            document.getElementById('description').value = draft.description;
            if (!draft.imageUrl) {
                document.getElementById('image').value = '';
            }
        }

        function renderGallery(cards) {
            const gallery = document.getElementById('gallery');
            gallery.innerHTML = '';
            for (const card of cards) {
                const item = document.createElement('div');
                item.className = 'incident';
                const img = document.createElement('img');
                img.src = card.imageUrl;
                img.alt = 'Incident';
                const description = document.createElement('p');
                description.textContent = card.description;
                const caption = document.createElement('p');
                caption.className = 'caption';
                caption.textContent = card.caption;
                item.append(img, description, caption);
                gallery.appendChild(item);
            }
        }

        function applyMap(snapshot) {
            if (!map || snapshot.phase !== 'ready') {
                return;
            }
            if (snapshot.markerRevision !== markerRevision) {
                markers.forEach(m => m.setMap(null));
                markers = snapshot.markers.map(position => new google.maps.Marker({ position, map }));
                markerRevision = snapshot.markerRevision;
            }
            if (snapshot.camera.revision !== cameraRevision) {
                map.panTo(snapshot.camera.center);
                map.setZoom(snapshot.camera.zoom);
                cameraRevision = snapshot.camera.revision;
            }
        }

        async function refresh() {
            try {
                const { data } = await api('GET', '/api/session');
                renderGallery(data.incidents);
                applyMap(data.map);
            } catch (error) {
                console.error('Failed to fetch session:', error);
            }
        }

        window.initMap = async function () {
            const container = document.getElementById('map');
            container.style.width = CONFIG.container.width;
            container.style.height = CONFIG.container.height;
            container.style.display = 'block';
            document.getElementById('map-loading').style.display = 'none';
            map = new google.maps.Map(container, { center: CONFIG.center, zoom: CONFIG.defaultZoom });
            const { data } = await api('POST', '/api/map/ready');
            applyMap(data);
        };

        document.getElementById('lat').addEventListener('change', e => patchDraft({ lat: parseFloat(e.target.value) }));
        document.getElementById('lng').addEventListener('change', e => patchDraft({ lng: parseFloat(e.target.value) }));
        document.getElementById('description').addEventListener('input', e => patchDraft({ description: e.target.value }));
        document.getElementById('image').addEventListener('change', async e => {
            const file = e.target.files && e.target.files[0];
            if (!file) {
                return;
            }
            try {
                const bytes = await file.arrayBuffer();
                await track(api('PUT', '/api/draft/image', bytes, file.type || 'application/octet-stream'));
            } catch (error) {
                console.error('Failed to read image:', error);
            }
        });

        document.getElementById('incident-form').addEventListener('submit', async e => {
            e.preventDefault();
            await Promise.allSettled([...pending]);
            const { status, data } = await api('POST', '/api/incidents', JSON.stringify(formFields()));
            const errorBox = document.getElementById('form-error');
            if (status === 201) {
                errorBox.textContent = '';
                const session = await api('GET', '/api/session');
                fillForm(session.data.draft);
                await refresh();
            } else {
                errorBox.textContent = data ? data.error : 'error';
            }
        });

        async function boot() {
            const { data } = await api('GET', '/api/session');
            fillForm(data.draft);
            renderGallery(data.incidents);
            if (CONFIG.apiKey) {
                const script = document.createElement('script');
                script.src = `https://maps.googleapis.com/maps/api/js?key=${encodeURIComponent(CONFIG.apiKey)}&callback=initMap`;
                script.async = true;
                document.head.appendChild(script);
            }
        }

        boot();
        setInterval(refresh, 2000);
    </script>
</body>
</html>
"#;
