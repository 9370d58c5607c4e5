//! The single page served at `/`.

pub const INDEX_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Analyzer Prototype</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            padding: 20px;
        }

        .container {
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            max-width: 860px;
            width: 100%;
            padding: 40px;
            align-self: flex-start;
        }

        h1 {
            color: #333;
            margin-bottom: 10px;
            font-size: 2em;
        }

        .subtitle {
            color: #666;
            margin-bottom: 30px;
            font-size: 0.95em;
        }

        label.field {
            display: block;
            color: #333;
            font-weight: 600;
            margin-bottom: 8px;
        }

        input[type="password"] {
            width: 100%;
            padding: 12px;
            border: 2px solid #e0e0e0;
            border-radius: 10px;
            font-size: 1em;
            margin-bottom: 12px;
        }

        button {
            background: #667eea;
            color: white;
            border: none;
            padding: 10px 24px;
            border-radius: 20px;
            font-weight: 600;
            cursor: pointer;
        }

        button:disabled {
            background: #aab4f0;
            cursor: default;
        }

        .categories {
            margin: 10px 0 25px;
        }

        .category {
            display: flex;
            gap: 10px;
            align-items: flex-start;
            padding: 8px 0;
        }

        .category-caption {
            color: #999;
            font-size: 0.85em;
        }

        .upload-area {
            border: 3px dashed #667eea;
            border-radius: 15px;
            padding: 40px 20px;
            text-align: center;
            cursor: pointer;
            transition: all 0.3s;
            background: #f8f9ff;
            margin-bottom: 20px;
        }

        .upload-area:hover {
            border-color: #764ba2;
            background: #f0f2ff;
        }

        .upload-area.dragover {
            border-color: #764ba2;
            background: #e8ebff;
            transform: scale(1.02);
        }

        .upload-text {
            color: #667eea;
            font-size: 1.2em;
            font-weight: 600;
            margin-bottom: 10px;
        }

        .upload-hint {
            color: #999;
            font-size: 0.9em;
        }

        input[type="file"] {
            display: none;
        }

        .loading {
            text-align: center;
            padding: 40px;
            display: none;
        }

        .spinner {
            border: 4px solid #f3f3f3;
            border-top: 4px solid #667eea;
            border-radius: 50%;
            width: 50px;
            height: 50px;
            animation: spin 1s linear infinite;
            margin: 0 auto 20px;
        }

        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }

        .status-line {
            color: #333;
            margin-top: 20px;
        }

        .locator {
            color: #666;
            font-family: monospace;
            font-size: 0.9em;
            margin-bottom: 10px;
        }

        figure {
            background: #f8f9ff;
            border-radius: 10px;
            padding: 20px;
            margin-top: 10px;
        }

        figure img {
            max-width: 100%;
            border-radius: 10px;
            box-shadow: 0 4px 15px rgba(0,0,0,0.1);
        }

        figcaption {
            color: #333;
            line-height: 1.6;
            margin-top: 15px;
            white-space: pre-wrap;
        }

        .meta-info {
            color: #666;
            font-size: 0.85em;
            margin-top: 10px;
        }

        .success {
            background: #efe;
            border: 2px solid #cfc;
            color: #363;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
        }

        .error {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
        }

        .hidden {
            display: none;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Image Analyzer Prototype ✨</h1>
        <p class="subtitle">Upload images to create alt text and long descriptions.</p>

        <form id="loginForm">
            <label class="field" for="password">Password</label>
            <input type="password" id="password" autocomplete="current-password">
            <button type="submit">Enter</button>
        </form>
        <div class="error hidden" id="loginError"></div>

        <form id="analyzeForm" class="hidden">
            <label class="field">What type of images are you analyzing?</label>
            <div class="categories" id="categories"></div>

            <div class="upload-area" id="uploadArea">
                <div class="upload-text">Choose your images...</div>
                <div class="upload-hint" id="uploadHint">JPG, PNG or JPEG • several at once</div>
                <input type="file" id="fileInput" accept=".jpg,.png,.jpeg" multiple>
            </div>
            <button type="submit" id="analyzeButton" disabled>Analyze</button>
        </form>

        <div class="loading" id="loading">
            <div class="spinner"></div>
            <p>Wait for it...</p>
        </div>

        <div id="results"></div>
    </div>

    <script>
        const ALLOWED = ['jpg', 'png', 'jpeg'];
        const loginForm = document.getElementById('loginForm');
        const loginError = document.getElementById('loginError');
        const passwordInput = document.getElementById('password');
        const analyzeForm = document.getElementById('analyzeForm');
        const categoriesDiv = document.getElementById('categories');
        const uploadArea = document.getElementById('uploadArea');
        const uploadHint = document.getElementById('uploadHint');
        const fileInput = document.getElementById('fileInput');
        const analyzeButton = document.getElementById('analyzeButton');
        const loading = document.getElementById('loading');
        const results = document.getElementById('results');

        let selectedFiles = [];

        function el(tag, className, text) {
            const node = document.createElement(tag);
            if (className) node.className = className;
            if (text !== undefined) node.textContent = text;
            return node;
        }

        async function loadCategories() {
            const response = await fetch('/api/categories');
            const categories = await response.json();
            categories.forEach((category, index) => {
                const row = el('label', 'category');
                const radio = document.createElement('input');
                radio.type = 'radio';
                radio.name = 'category';
                radio.value = category.label;
                radio.checked = index === 0;
                const text = el('div');
                text.appendChild(el('div', null, category.label));
                text.appendChild(el('div', 'category-caption', category.caption));
                row.appendChild(radio);
                row.appendChild(text);
                categoriesDiv.appendChild(row);
            });
        }

        loginForm.addEventListener('submit', async (e) => {
            e.preventDefault();
            loginError.classList.add('hidden');
            const response = await fetch('/api/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ password: passwordInput.value })
            });
            if (response.ok) {
                loginForm.classList.add('hidden');
                analyzeForm.classList.remove('hidden');
                await loadCategories();
            } else {
                loginError.textContent = 'Access denied.';
                loginError.classList.remove('hidden');
            }
        });

        function setFiles(files) {
            selectedFiles = Array.from(files).filter((file) => {
                const ext = file.name.split('.').pop().toLowerCase();
                return ALLOWED.includes(ext);
            });
            uploadHint.textContent = selectedFiles.length
                ? selectedFiles.map((f) => f.name).join(', ')
                : 'JPG, PNG or JPEG • several at once';
            analyzeButton.disabled = selectedFiles.length === 0;
        }

        uploadArea.addEventListener('click', () => fileInput.click());

        uploadArea.addEventListener('dragover', (e) => {
            e.preventDefault();
            uploadArea.classList.add('dragover');
        });

        uploadArea.addEventListener('dragleave', () => {
            uploadArea.classList.remove('dragover');
        });

        uploadArea.addEventListener('drop', (e) => {
            e.preventDefault();
            uploadArea.classList.remove('dragover');
            setFiles(e.dataTransfer.files);
        });

        fileInput.addEventListener('change', (e) => setFiles(e.target.files));

        function render(report, files) {
            const previews = files.map((f) => URL.createObjectURL(f));
            report.events.forEach((event) => {
                if (event.kind === 'uploaded') {
                    results.appendChild(el('p', 'status-line', event.message));
                    results.appendChild(el('p', 'locator', 'Image URL: ' + event.locator));
                } else if (event.kind === 'captioned') {
                    const figure = el('figure');
                    const img = document.createElement('img');
                    img.src = previews[event.index] || '';
                    img.alt = event.file_name;
                    figure.appendChild(img);
                    figure.appendChild(el('figcaption', null, event.caption));
                    figure.appendChild(el('div', 'meta-info', 'Processing: ' + event.processing_time_ms + 'ms'));
                    results.appendChild(figure);
                }
            });

            if (report.outcome.status === 'completed') {
                results.appendChild(el('div', 'success', report.outcome.message));
            } else if (report.outcome.status === 'aborted') {
                results.appendChild(el('div', 'error',
                    'Error while processing ' + report.outcome.file_name + ': ' + report.outcome.error));
            }
        }

        analyzeForm.addEventListener('submit', async (e) => {
            e.preventDefault();
            const files = selectedFiles;
            const checked = analyzeForm.querySelector('input[name="category"]:checked');

            const formData = new FormData();
            formData.append('password', passwordInput.value);
            if (checked) formData.append('category', checked.value);
            files.forEach((file) => formData.append('images', file));

            results.innerHTML = '';
            loading.style.display = 'block';
            analyzeButton.disabled = true;

            try {
                const response = await fetch('/api/analyze', {
                    method: 'POST',
                    body: formData
                });
                const body = await response.json();
                if (!response.ok) {
                    throw new Error(body.error || 'Request failed');
                }
                render(body, files);
            } catch (error) {
                results.appendChild(el('div', 'error', 'Error: ' + error.message));
            } finally {
                loading.style.display = 'none';
                analyzeButton.disabled = selectedFiles.length === 0;
            }
        });
    </script>
</body>
</html>
"#;
